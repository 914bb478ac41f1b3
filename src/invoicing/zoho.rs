//! Zoho Books client
//!
//! Access tokens come from the OAuth refresh-token grant. With the `cache`
//! feature and a Redis pool the token is kept until shortly before it expires;
//! otherwise a fresh token is minted for every call. Nothing here retries.

#[cfg(feature = "cache")]
use crate::cache::{keys, Cache, RedisCache};
use crate::database::invoice_repository::{Invoice, InvoiceStatus};
use crate::error::{AppError, AppResult};
use crate::invoicing::{RemoteCustomer, RemoteInvoicing};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const SERVICE: &str = "Zoho Books";

/// Seconds shaved off the token lifetime before it is considered stale
#[cfg(feature = "cache")]
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ZohoConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub organization_id: String,
    /// OAuth host, e.g. https://accounts.zoho.in
    pub accounts_url: String,
    /// Books API root, e.g. https://www.zohoapis.in/books/v3
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl ZohoConfig {
    /// Load from the environment. Either all four credentials are set, or none
    /// are and invoicing stays local.
    pub fn from_env() -> AppResult<Option<Self>> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let credentials = [
            ("ZOHO_CLIENT_ID", read("ZOHO_CLIENT_ID")),
            ("ZOHO_CLIENT_SECRET", read("ZOHO_CLIENT_SECRET")),
            ("ZOHO_REFRESH_TOKEN", read("ZOHO_REFRESH_TOKEN")),
            ("ZOHO_ORGANIZATION_ID", read("ZOHO_ORGANIZATION_ID")),
        ];

        let missing: Vec<&str> = credentials
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();

        if missing.len() == credentials.len() {
            return Ok(None);
        }
        if !missing.is_empty() {
            return Err(AppError::configuration(format!(
                "Zoho Books is partially configured; missing {}",
                missing.join(", ")
            )));
        }

        let [(_, Some(client_id)), (_, Some(client_secret)), (_, Some(refresh_token)), (_, Some(organization_id))] =
            credentials
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            client_id,
            client_secret,
            refresh_token,
            organization_id,
            accounts_url: read("ZOHO_ACCOUNTS_URL")
                .unwrap_or_else(|| "https://accounts.zoho.in".to_string()),
            api_base_url: read("ZOHO_API_BASE_URL")
                .unwrap_or_else(|| "https://www.zohoapis.in/books/v3".to_string()),
            timeout_secs: 30,
        }))
    }
}

/// Translate a Zoho invoice status into ours
pub fn map_remote_status(status: &str) -> Option<InvoiceStatus> {
    match status {
        "draft" => Some(InvoiceStatus::Draft),
        "sent" | "viewed" | "unpaid" | "partially_paid" => Some(InvoiceStatus::Sent),
        "paid" => Some(InvoiceStatus::Paid),
        "overdue" => Some(InvoiceStatus::Overdue),
        "void" => Some(InvoiceStatus::Cancelled),
        _ => None,
    }
}

#[cfg(feature = "cache")]
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
struct CachedToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContactList {
    #[serde(default)]
    contacts: Vec<Contact>,
}

#[derive(Debug, Deserialize)]
struct ContactEnvelope {
    contact: Contact,
}

#[derive(Debug, Deserialize)]
struct Contact {
    contact_id: String,
}

#[derive(Debug, Deserialize)]
struct InvoiceEnvelope {
    invoice: RemoteInvoice,
}

#[derive(Debug, Deserialize)]
struct RemoteInvoice {
    invoice_id: String,
    status: String,
    #[serde(default)]
    customer_id: Option<String>,
}

pub struct ZohoBooksClient {
    config: ZohoConfig,
    client: Client,
    #[cfg(feature = "cache")]
    token_cache: Option<RedisCache>,
}

impl ZohoBooksClient {
    pub fn new(config: ZohoConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            #[cfg(feature = "cache")]
            token_cache: None,
        })
    }

    #[cfg(feature = "cache")]
    pub fn with_token_cache(mut self, cache: RedisCache) -> Self {
        self.token_cache = Some(cache);
        self
    }

    #[cfg(feature = "cache")]
    fn token_key(&self) -> String {
        keys::invoicing_token("zoho", &self.config.organization_id)
    }

    async fn access_token(&self) -> AppResult<String> {
        #[cfg(feature = "cache")]
        if let Some(cache) = &self.token_cache {
            match <RedisCache as Cache<CachedToken>>::get(cache, &self.token_key()).await {
                Ok(Some(token)) => return Ok(token.access_token),
                Ok(None) => {}
                Err(e) => warn!("Zoho token cache lookup failed: {}", e),
            }
        }

        let (access_token, expires_in) = self.mint_token().await?;

        #[cfg(feature = "cache")]
        if let Some(cache) = &self.token_cache {
            let ttl = expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
            if ttl > 0 {
                let token = CachedToken {
                    access_token: access_token.clone(),
                };
                if let Err(e) = cache
                    .set(&self.token_key(), &token, Some(Duration::from_secs(ttl)))
                    .await
                {
                    warn!("Failed to cache Zoho access token: {}", e);
                }
            }
        }
        #[cfg(not(feature = "cache"))]
        let _ = expires_in;

        Ok(access_token)
    }

    async fn invalidate_token(&self) {
        #[cfg(feature = "cache")]
        if let Some(cache) = &self.token_cache {
            if let Err(e) = <RedisCache as Cache<CachedToken>>::delete(cache, &self.token_key()).await {
                warn!("Failed to drop cached Zoho token: {}", e);
            }
        }
    }

    /// Refresh-token grant. Zoho reports grant errors with HTTP 200 and an
    /// `error` field, so both are checked.
    async fn mint_token(&self) -> AppResult<(String, u64)> {
        let url = format!("{}/oauth/v2/token", self.config.accounts_url);
        let response = self
            .client
            .post(&url)
            .query(&[
                ("refresh_token", self.config.refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::invoicing(SERVICE, format!("token request failed: {}", e)))?;

        let status = response.status();
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::invoicing(SERVICE, format!("invalid token response: {}", e)))?;

        match (status.is_success(), body.access_token, body.error) {
            (true, Some(token), None) => {
                debug!("Minted Zoho access token");
                Ok((token, body.expires_in.unwrap_or(3600)))
            }
            (_, _, Some(error)) => Err(AppError::invoicing(SERVICE, format!("token grant rejected: {}", error))),
            _ => Err(AppError::invoicing(
                SERVICE,
                format!("token grant failed with HTTP {}", status),
            )),
        }
    }

    /// Authenticated request with the organization scope attached
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> AppResult<reqwest::Response> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.config.api_base_url, path);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Zoho-oauthtoken {}", token))
            .query(&[("organization_id", self.config.organization_id.as_str())])
            .query(query);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::invoicing(SERVICE, format!("request to {} failed: {}", path, e)))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
        }

        Ok(response)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> AppResult<T> {
        let response = self.request(method, path, query, body).await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let envelope: Envelope = serde_json::from_str(&text).map_err(|e| {
            AppError::invoicing(SERVICE, format!("HTTP {} with unreadable body: {}", status, e))
        })?;

        if !status.is_success() || envelope.code != 0 {
            return Err(AppError::invoicing(
                SERVICE,
                format!(
                    "HTTP {} code {}: {}",
                    status,
                    envelope.code,
                    envelope.message.unwrap_or_default()
                ),
            ));
        }

        serde_json::from_str(&text)
            .map_err(|e| AppError::invoicing(SERVICE, format!("unexpected response shape: {}", e)))
    }

    async fn find_or_create_contact(&self, customer: &RemoteCustomer) -> AppResult<String> {
        let found: ContactList = self
            .call(Method::GET, "/contacts", &[("email", customer.email.as_str())], None)
            .await?;

        if let Some(contact) = found.contacts.into_iter().next() {
            return Ok(contact.contact_id);
        }

        let payload = json!({
            "contact_name": customer.name,
            "contact_type": "customer",
            "contact_persons": [{
                "email": customer.email,
                "is_primary_contact": true,
            }],
        });
        let created: ContactEnvelope = self.call(Method::POST, "/contacts", &[], Some(&payload)).await?;
        info!(contact_id = %created.contact.contact_id, "Created Zoho contact");
        Ok(created.contact.contact_id)
    }

    async fn fetch_invoice(&self, external_id: &str) -> AppResult<RemoteInvoice> {
        let envelope: InvoiceEnvelope = self
            .call(Method::GET, &format!("/invoices/{}", external_id), &[], None)
            .await?;
        Ok(envelope.invoice)
    }
}

/// Body shared by invoice create and update
pub fn invoice_payload(invoice: &Invoice, customer_id: Option<&str>) -> Value {
    let line_items: Vec<Value> = invoice
        .line_items
        .iter()
        .map(|item| {
            let mut line = json!({
                "name": item.description,
                "description": item.description,
                "quantity": item.quantity,
                "rate": item.rate,
            });
            if let Some(tax_rate) = item.tax_rate {
                line["tax_percentage"] = json!(tax_rate);
            }
            line
        })
        .collect();

    let mut payload = json!({
        "reference_number": invoice.invoice_number,
        "date": invoice.created_at.format("%Y-%m-%d").to_string(),
        "line_items": line_items,
        "discount": invoice.discount,
        "discount_type": "entity_level",
        "is_discount_before_tax": false,
    });

    if let Some(customer_id) = customer_id {
        payload["customer_id"] = json!(customer_id);
    }
    if let Some(due_date) = invoice.due_date {
        payload["due_date"] = json!(due_date.format("%Y-%m-%d").to_string());
    }
    if let Some(notes) = &invoice.notes {
        payload["notes"] = json!(notes);
    }

    payload
}

#[async_trait]
impl RemoteInvoicing for ZohoBooksClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn create_invoice(
        &self,
        invoice: &Invoice,
        customer: &RemoteCustomer,
    ) -> AppResult<String> {
        let customer_id = self.find_or_create_contact(customer).await?;
        let payload = invoice_payload(invoice, Some(&customer_id));

        let created: InvoiceEnvelope = self
            .call(Method::POST, "/invoices", &[], Some(&payload))
            .await?;
        Ok(created.invoice.invoice_id)
    }

    async fn update_invoice(&self, external_id: &str, invoice: &Invoice) -> AppResult<()> {
        let payload = invoice_payload(invoice, None);
        let _: InvoiceEnvelope = self
            .call(
                Method::PUT,
                &format!("/invoices/{}", external_id),
                &[],
                Some(&payload),
            )
            .await?;
        Ok(())
    }

    async fn fetch_status(&self, external_id: &str) -> AppResult<InvoiceStatus> {
        let remote = self.fetch_invoice(external_id).await?;
        map_remote_status(&remote.status).ok_or_else(|| {
            AppError::invoicing(SERVICE, format!("unrecognised invoice status '{}'", remote.status))
        })
    }

    async fn send_invoice(&self, external_id: &str, customer: &RemoteCustomer) -> AppResult<()> {
        let payload = json!({ "to_mail_ids": [customer.email] });
        let _: Envelope = self
            .call(
                Method::POST,
                &format!("/invoices/{}/email", external_id),
                &[],
                Some(&payload),
            )
            .await?;
        Ok(())
    }

    async fn mark_paid(&self, external_id: &str, invoice: &Invoice) -> AppResult<()> {
        let remote = self.fetch_invoice(external_id).await?;
        let customer_id = remote.customer_id.ok_or_else(|| {
            AppError::invoicing(SERVICE, "remote invoice has no customer")
        })?;

        let payload = json!({
            "customer_id": customer_id,
            "payment_mode": "razorpay",
            "amount": invoice.total,
            "date": chrono::Utc::now().format("%Y-%m-%d").to_string(),
            "invoices": [{
                "invoice_id": remote.invoice_id,
                "amount_applied": invoice.total,
            }],
        });

        let _: Envelope = self
            .call(Method::POST, "/customerpayments", &[], Some(&payload))
            .await?;
        Ok(())
    }

    async fn fetch_pdf(&self, external_id: &str) -> AppResult<Vec<u8>> {
        let response = self
            .request(
                Method::GET,
                &format!("/invoices/{}", external_id),
                &[("accept", "pdf")],
                None,
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::invoicing(
                SERVICE,
                format!("PDF download failed with HTTP {}", status),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::invoicing(SERVICE, format!("PDF download failed: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

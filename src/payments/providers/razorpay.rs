//! Razorpay payment gateway implementation
//!
//! Orders are minted through Razorpay's Orders API; checkout confirmations are
//! authenticated with an HMAC-SHA256 over `order_id|payment_id` keyed with the
//! account's key secret.

use crate::error::{AppError, AppResult};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{GatewayOrder, GatewayOrderRequest};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{error, info, warn};

type HmacSha256 = Hmac<Sha256>;

const PROVIDER: &str = "Razorpay";

/// Razorpay gateway configuration
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// Public key id, used as the basic-auth user
    pub key_id: String,
    /// Key secret, used as the basic-auth password and the HMAC key
    pub key_secret: String,
    /// API base URL (defaults to https://api.razorpay.com/v1)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: String::new(),
            base_url: "https://api.razorpay.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl RazorpayConfig {
    /// Create config from environment variables
    pub fn from_env() -> AppResult<Self> {
        let key_id = std::env::var("RAZORPAY_KEY_ID")
            .map_err(|_| AppError::configuration("RAZORPAY_KEY_ID environment variable is required"))?;
        let key_secret = std::env::var("RAZORPAY_KEY_SECRET").map_err(|_| {
            AppError::configuration("RAZORPAY_KEY_SECRET environment variable is required")
        })?;

        let base_url = std::env::var("RAZORPAY_BASE_URL")
            .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string());

        let timeout_secs = std::env::var("RAZORPAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            key_id,
            key_secret,
            base_url,
            timeout_secs,
        })
    }
}

fn signature_mac(secret: &str, order_ref: &str, payment_ref: &str) -> AppResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::configuration(format!("Razorpay key secret unusable: {}", e)))?;
    mac.update(order_ref.as_bytes());
    mac.update(b"|");
    mac.update(payment_ref.as_bytes());
    Ok(mac)
}

/// Hex-encoded HMAC-SHA256 of `order_ref|payment_ref` keyed with `secret`,
/// as Razorpay's checkout hands it back
pub fn payment_signature(secret: &str, order_ref: &str, payment_ref: &str) -> AppResult<String> {
    let mac = signature_mac(secret, order_ref, payment_ref)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Razorpay payment gateway
pub struct RazorpayProvider {
    config: RazorpayConfig,
    client: Client,
}

impl RazorpayProvider {
    /// Create a new Razorpay provider instance
    pub fn new(config: RazorpayConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Make an authenticated request to the Razorpay API
    async fn make_request<T>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url, endpoint);
        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret));

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Razorpay request to {} failed: {}", endpoint, e);
            AppError::payment_provider(PROVIDER, format!("request failed: {}", e))
        })?;

        let status = response.status();
        let response_text = response.text().await.unwrap_or_default();

        if status.is_success() {
            return serde_json::from_str::<T>(&response_text).map_err(|e| {
                error!("Failed to parse Razorpay response: {}", e);
                AppError::payment_provider(PROVIDER, format!("Invalid response format: {}", e))
            });
        }

        let message = serde_json::from_str::<RazorpayErrorEnvelope>(&response_text)
            .map(|envelope| envelope.error.description)
            .unwrap_or_else(|_| format!("HTTP {}: {}", status, response_text));

        if status.is_server_error() {
            error!("Razorpay API error: {}", message);
        } else {
            warn!("Razorpay rejected request: {}", message);
        }
        Err(AppError::payment_provider(PROVIDER, message))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn create_order(&self, request: GatewayOrderRequest) -> AppResult<GatewayOrder> {
        info!(
            "Creating Razorpay order: {} {} receipt={}",
            request.amount, request.currency, request.receipt
        );

        let mut payload = serde_json::json!({
            "amount": request.amount,
            "currency": request.currency,
            "receipt": request.receipt,
        });

        if let Some(notes) = request.notes {
            payload["notes"] = notes;
        }

        let order: RazorpayOrderResponse = self
            .make_request(reqwest::Method::POST, "/orders", Some(&payload))
            .await?;

        info!("Razorpay order created: id={}, status={}", order.id, order.status);

        Ok(GatewayOrder {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt,
            status: order.status,
        })
    }

    fn verify_payment_signature(&self, order_ref: &str, payment_ref: &str, signature: &str) -> bool {
        let Ok(provided) = hex::decode(signature.trim()) else {
            return false;
        };

        let Ok(mac) = signature_mac(&self.config.key_secret, order_ref, payment_ref) else {
            return false;
        };

        // verify_slice compares in constant time
        mac.verify_slice(&provided).is_ok()
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayOrderResponse {
    id: String,
    amount: u64,
    currency: String,
    #[serde(default)]
    receipt: Option<String>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorEnvelope {
    error: RazorpayErrorBody,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorBody {
    description: String,
}

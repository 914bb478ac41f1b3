//! Invoice pricing, numbering and the best-effort mirror into the remote
//! accounting service.
//!
//! The local invoice row is always the source of truth. Every remote call made
//! through [`InvoiceSync`] is caught and logged so that a remote outage never
//! fails a local create, update or send.

pub mod zoho;

use crate::database::invoice_repository::{Invoice, InvoiceStatus};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

pub use zoho::{ZohoBooksClient, ZohoConfig};

/// A priced invoice line as stored and returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<f64>,
}

/// A line as submitted by a client; `amount` and `tax_amount` are always
/// recomputed
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemInput {
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
    #[serde(default)]
    pub tax_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub tax_total: f64,
    pub discount: f64,
    pub total: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Price every line and compute the invoice totals.
///
/// `amount = quantity × rate`, `tax_amount = amount × tax_rate / 100`,
/// `total = subtotal + tax − discount`, each rounded to two decimals.
pub fn price_line_items(
    inputs: &[LineItemInput],
    discount: f64,
) -> AppResult<(Vec<LineItem>, InvoiceTotals)> {
    if inputs.is_empty() {
        return Err(AppError::validation("an invoice needs at least one line item"));
    }
    if !discount.is_finite() || discount < 0.0 {
        return Err(AppError::validation("discount must be zero or positive"));
    }

    let mut items = Vec::with_capacity(inputs.len());
    let mut subtotal = 0.0;
    let mut tax_total = 0.0;

    for (index, input) in inputs.iter().enumerate() {
        if input.description.trim().is_empty() {
            return Err(AppError::validation(format!(
                "line item {} has no description",
                index + 1
            )));
        }
        if !input.quantity.is_finite() || input.quantity <= 0.0 {
            return Err(AppError::validation(format!(
                "line item {} quantity must be positive",
                index + 1
            )));
        }
        if !input.rate.is_finite() || input.rate < 0.0 {
            return Err(AppError::validation(format!(
                "line item {} rate must not be negative",
                index + 1
            )));
        }
        if let Some(rate) = input.tax_rate {
            if !(0.0..=100.0).contains(&rate) {
                return Err(AppError::validation(format!(
                    "line item {} tax rate must be between 0 and 100",
                    index + 1
                )));
            }
        }

        let amount = round2(input.quantity * input.rate);
        let tax_amount = input.tax_rate.map(|rate| round2(amount * rate / 100.0));

        subtotal += amount;
        tax_total += tax_amount.unwrap_or(0.0);

        items.push(LineItem {
            description: input.description.trim().to_string(),
            quantity: input.quantity,
            rate: input.rate,
            amount,
            tax_rate: input.tax_rate,
            tax_amount,
        });
    }

    let subtotal = round2(subtotal);
    let tax_total = round2(tax_total);
    let discount = round2(discount);
    let total = round2(subtotal + tax_total - discount);

    if total < 0.0 {
        return Err(AppError::validation("discount exceeds the invoice amount"));
    }

    Ok((
        items,
        InvoiceTotals {
            subtotal,
            tax_total,
            discount,
            total,
        },
    ))
}

/// Prefix shared by every invoice number issued in `year`
pub fn invoice_number_prefix(year: i32) -> String {
    format!("INV-{}-", year)
}

fn invoice_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^INV-(\d{4})-(\d+)$").expect("invoice number pattern is valid")
    })
}

/// Next `INV-<YYYY>-<NNNN>` number, continuing from the latest one of the
/// same year. Anything unparseable restarts the sequence at 0001.
pub fn next_invoice_number(year: i32, latest: Option<&str>) -> String {
    let next = latest
        .and_then(|number| invoice_number_pattern().captures(number))
        .filter(|caps| caps[1].parse::<i32>().ok() == Some(year))
        .and_then(|caps| caps[2].parse::<u32>().ok())
        .map(|seq| seq + 1)
        .unwrap_or(1);

    format!("{}{:04}", invoice_number_prefix(year), next)
}

/// The contact an invoice is addressed to on the remote side
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCustomer {
    pub name: String,
    pub email: String,
}

/// Remote accounting service holding a mirror of our invoices
#[async_trait]
pub trait RemoteInvoicing: Send + Sync {
    fn name(&self) -> &'static str;

    /// Create the remote invoice, returning its external id
    async fn create_invoice(&self, invoice: &Invoice, customer: &RemoteCustomer)
        -> AppResult<String>;

    async fn update_invoice(&self, external_id: &str, invoice: &Invoice) -> AppResult<()>;

    /// Remote status translated into our vocabulary
    async fn fetch_status(&self, external_id: &str) -> AppResult<InvoiceStatus>;

    /// Email the invoice to the customer
    async fn send_invoice(&self, external_id: &str, customer: &RemoteCustomer) -> AppResult<()>;

    /// Record a payment covering the invoice total
    async fn mark_paid(&self, external_id: &str, invoice: &Invoice) -> AppResult<()>;

    async fn fetch_pdf(&self, external_id: &str) -> AppResult<Vec<u8>>;
}

/// Best-effort front for the optional remote invoicing backend
#[derive(Clone, Default)]
pub struct InvoiceSync {
    remote: Option<Arc<dyn RemoteInvoicing>>,
}

impl InvoiceSync {
    pub fn new(remote: Arc<dyn RemoteInvoicing>) -> Self {
        Self {
            remote: Some(remote),
        }
    }

    /// Local-only invoicing
    pub fn disabled() -> Self {
        Self { remote: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Mirror a freshly created invoice, returning the external id on success
    pub async fn push_new(&self, invoice: &Invoice, customer: &RemoteCustomer) -> Option<String> {
        let remote = self.remote.as_ref()?;
        match remote.create_invoice(invoice, customer).await {
            Ok(external_id) => {
                info!(
                    invoice_id = %invoice.id,
                    external_id = %external_id,
                    "Invoice mirrored to {}",
                    remote.name()
                );
                Some(external_id)
            }
            Err(e) => {
                warn!(invoice_id = %invoice.id, "Remote invoice creation failed: {}", e);
                None
            }
        }
    }

    /// Push local changes; a transition to paid also records the payment
    pub async fn push_update(&self, invoice: &Invoice, became_paid: bool) {
        let (Some(remote), Some(external_id)) = (self.remote.as_ref(), invoice.external_id.as_deref())
        else {
            return;
        };

        if let Err(e) = remote.update_invoice(external_id, invoice).await {
            warn!(invoice_id = %invoice.id, "Remote invoice update failed: {}", e);
        }

        if became_paid {
            if let Err(e) = remote.mark_paid(external_id, invoice).await {
                warn!(invoice_id = %invoice.id, "Remote payment recording failed: {}", e);
            }
        }
    }

    /// Email the invoice through the remote service. Returns whether it went out.
    pub async fn send(&self, invoice: &Invoice, customer: &RemoteCustomer) -> bool {
        let (Some(remote), Some(external_id)) = (self.remote.as_ref(), invoice.external_id.as_deref())
        else {
            debug!(invoice_id = %invoice.id, "No remote copy; invoice marked sent locally only");
            return false;
        };

        match remote.send_invoice(external_id, customer).await {
            Ok(()) => true,
            Err(e) => {
                warn!(invoice_id = %invoice.id, "Remote invoice email failed: {}", e);
                false
            }
        }
    }

    /// Remote status when it differs from the local one
    pub async fn refresh_status(&self, invoice: &Invoice) -> Option<InvoiceStatus> {
        let remote = self.remote.as_ref()?;
        let external_id = invoice.external_id.as_deref()?;

        match remote.fetch_status(external_id).await {
            Ok(status) if status.as_str() != invoice.status => Some(status),
            Ok(_) => None,
            Err(e) => {
                warn!(invoice_id = %invoice.id, "Remote invoice status lookup failed: {}", e);
                None
            }
        }
    }

    /// PDF rendering lives remotely, so this one is not best effort
    pub async fn pdf(&self, invoice: &Invoice) -> AppResult<Vec<u8>> {
        let (Some(remote), Some(external_id)) = (self.remote.as_ref(), invoice.external_id.as_deref())
        else {
            return Err(AppError::not_found("Invoice PDF"));
        };

        remote.fetch_pdf(external_id).await
    }
}

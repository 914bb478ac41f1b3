//! Payment gateway types and request/response bodies for the checkout endpoints.

use serde::{Deserialize, Serialize};

/// Request to mint a gateway order before opening the checkout widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrderRequest {
    /// Amount in the smallest currency unit (paise for INR)
    pub amount: u64,
    /// Currency code (INR)
    pub currency: String,
    /// Our own reference, echoed back by the gateway
    pub receipt: String,
    /// Free-form key/value notes stored with the gateway order
    pub notes: Option<serde_json::Value>,
}

/// Order reference issued by the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

/// Body of `POST /api/createOrder`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    /// Amount in major units as shown to the customer
    pub amount: f64,
    pub project_id: Option<String>,
    pub currency: Option<String>,
}

/// Body of `POST /api/verifyOrder`. Every field is optional here so that a
/// missing field produces our own 400 rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOrderBody {
    pub order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub amount: Option<f64>,
}

/// A verification request with every precondition satisfied
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
    pub user_id: String,
    pub order_id: String,
    pub amount: f64,
}

impl VerifyOrderBody {
    /// Check presence of every field, naming the missing ones on failure
    pub fn into_request(self) -> Result<VerifyPaymentRequest, Vec<&'static str>> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        let gateway_order_id = present(self.order_id);
        let gateway_payment_id = present(self.razorpay_payment_id);
        let signature = present(self.razorpay_signature);
        let user_id = present(self.user_id);
        let order_id = present(self.project_id);
        let amount = self.amount.filter(|a| a.is_finite() && *a > 0.0);

        let mut missing = Vec::new();
        if gateway_order_id.is_none() {
            missing.push("orderId");
        }
        if gateway_payment_id.is_none() {
            missing.push("razorpayPaymentId");
        }
        if signature.is_none() {
            missing.push("razorpaySignature");
        }
        if user_id.is_none() {
            missing.push("userId");
        }
        if order_id.is_none() {
            missing.push("projectId");
        }
        if amount.is_none() {
            missing.push("amount");
        }

        match (gateway_order_id, gateway_payment_id, signature, user_id, order_id, amount) {
            (Some(gateway_order_id), Some(gateway_payment_id), Some(signature), Some(user_id), Some(order_id), Some(amount)) => {
                Ok(VerifyPaymentRequest {
                    gateway_order_id,
                    gateway_payment_id,
                    signature,
                    user_id,
                    order_id,
                    amount,
                })
            }
            _ => Err(missing),
        }
    }
}

/// Response of `POST /api/verifyOrder`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOrderResponse {
    pub message: String,
    pub is_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

impl VerifyOrderResponse {
    pub fn ok(message: impl Into<String>, payment_id: String) -> Self {
        Self {
            message: message.into(),
            is_ok: true,
            payment_id: Some(payment_id),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_ok: false,
            payment_id: None,
        }
    }
}

/// Convert a major-unit amount (rupees) to minor units (paise)
pub fn to_minor_units(amount: f64) -> Option<u64> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    Some((amount * 100.0).round() as u64)
}

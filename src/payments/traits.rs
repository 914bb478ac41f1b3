//! Payment gateway trait definitions

use crate::error::AppResult;
use crate::payments::types::{GatewayOrder, GatewayOrderRequest};
use async_trait::async_trait;

/// Trait for payment gateway implementations
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Gateway name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Mint a gateway order that the hosted checkout will collect payment for
    ///
    /// # Arguments
    /// * `request` - Amount in minor units, currency and our receipt reference
    async fn create_order(&self, request: GatewayOrderRequest) -> AppResult<GatewayOrder>;

    /// Check that a checkout confirmation was issued by the gateway
    ///
    /// # Arguments
    /// * `order_ref` - Gateway order id the checkout was opened for
    /// * `payment_ref` - Gateway payment id returned by the checkout
    /// * `signature` - Signature returned by the checkout, hex encoded
    ///
    /// # Returns
    /// * `bool` - True only when the signature matches, compared in constant time
    fn verify_payment_signature(&self, order_ref: &str, payment_ref: &str, signature: &str) -> bool;
}

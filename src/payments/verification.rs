//! Checkout confirmation flow.
//!
//! One attempt always produces exactly one payment transaction row. The order
//! is only touched after a successful signature check, and the two writes are
//! sequential with no transaction around them: a failing order update leaves
//! the success row in place.

use crate::database::order_repository::{Order, OrderStatus, OrderStore, PaymentStatus};
use crate::database::payment_transaction_repository::{
    NewPaymentTransaction, PaymentTransaction, PaymentTransactionStore, TransactionStatus,
};
use crate::error::{AppError, AppResult};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::VerifyPaymentRequest;
use tracing::{info, warn};

pub const SIGNATURE_MISMATCH_REASON: &str = "Signature verification failed";

#[derive(Debug)]
pub enum VerificationOutcome {
    /// Signature matched and the order moved to Processing / Paid
    Verified {
        transaction: PaymentTransaction,
        order: Order,
    },
    /// Signature did not match; a failed transaction was recorded
    SignatureMismatch { transaction: PaymentTransaction },
}

pub struct PaymentVerifier<'a> {
    gateway: &'a dyn PaymentGateway,
    orders: &'a dyn OrderStore,
    transactions: &'a dyn PaymentTransactionStore,
    currency: &'a str,
}

impl<'a> PaymentVerifier<'a> {
    pub fn new(
        gateway: &'a dyn PaymentGateway,
        orders: &'a dyn OrderStore,
        transactions: &'a dyn PaymentTransactionStore,
        currency: &'a str,
    ) -> Self {
        Self {
            gateway,
            orders,
            transactions,
            currency,
        }
    }

    /// Verify a checkout confirmation and record the attempt.
    ///
    /// Returns `NotFound` when the signature is valid but the order is missing;
    /// the success transaction has already been written at that point.
    pub async fn verify(&self, request: &VerifyPaymentRequest) -> AppResult<VerificationOutcome> {
        let valid = self.gateway.verify_payment_signature(
            &request.gateway_order_id,
            &request.gateway_payment_id,
            &request.signature,
        );

        let (status, failure_reason) = if valid {
            (TransactionStatus::Success, None)
        } else {
            (
                TransactionStatus::Failed,
                Some(SIGNATURE_MISMATCH_REASON.to_string()),
            )
        };

        let transaction = self
            .transactions
            .insert(&NewPaymentTransaction {
                user_id: request.user_id.clone(),
                order_id: request.order_id.clone(),
                gateway_order_id: request.gateway_order_id.clone(),
                gateway_payment_id: request.gateway_payment_id.clone(),
                amount: request.amount,
                currency: self.currency.to_string(),
                status,
                failure_reason,
            })
            .await?;

        if !valid {
            warn!(
                order_id = %request.order_id,
                gateway = self.gateway.name(),
                gateway_order_id = %request.gateway_order_id,
                transaction_id = %transaction.id,
                "Payment signature mismatch"
            );
            return Ok(VerificationOutcome::SignatureMismatch { transaction });
        }

        if self.orders.find_by_id(&request.order_id).await?.is_none() {
            warn!(
                order_id = %request.order_id,
                transaction_id = %transaction.id,
                "Verified payment references an unknown order"
            );
            return Err(AppError::not_found("Order"));
        }

        // Applies to Completed and Cancelled orders too; a captured payment always lands
        let order = self
            .orders
            .set_payment_state(&request.order_id, OrderStatus::Processing, PaymentStatus::Paid)
            .await?
            .ok_or_else(|| AppError::not_found("Order"))?;

        info!(
            order_id = %order.id,
            transaction_id = %transaction.id,
            amount = request.amount,
            "Payment verified"
        );

        Ok(VerificationOutcome::Verified { transaction, order })
    }
}

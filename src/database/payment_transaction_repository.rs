use crate::database::error::DatabaseError;
use crate::database::new_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Outcome recorded for one verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// Payment transaction entity. Rows are written once and never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: String,
    pub user_id: String,
    pub order_id: String,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentTransaction {
    pub user_id: String,
    pub order_id: String,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: TransactionStatus,
    pub failure_reason: Option<String>,
}

#[async_trait]
pub trait PaymentTransactionStore: Send + Sync {
    async fn insert(
        &self,
        transaction: &NewPaymentTransaction,
    ) -> Result<PaymentTransaction, DatabaseError>;

    async fn list_for_order(&self, order_id: &str)
        -> Result<Vec<PaymentTransaction>, DatabaseError>;
}

const TRANSACTION_COLUMNS: &str = "id, user_id, order_id, gateway_order_id, gateway_payment_id, \
     amount, currency, status, failure_reason, created_at";

/// Repository for the payment_transactions audit table
pub struct PaymentTransactionRepository {
    pool: PgPool,
}

impl PaymentTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentTransactionStore for PaymentTransactionRepository {
    async fn insert(
        &self,
        transaction: &NewPaymentTransaction,
    ) -> Result<PaymentTransaction, DatabaseError> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            "INSERT INTO payment_transactions \
             (id, user_id, order_id, gateway_order_id, gateway_payment_id, amount, currency, \
              status, failure_reason, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(new_id())
        .bind(&transaction.user_id)
        .bind(&transaction.order_id)
        .bind(&transaction.gateway_order_id)
        .bind(&transaction.gateway_payment_id)
        .bind(transaction.amount)
        .bind(&transaction.currency)
        .bind(transaction.status.as_str())
        .bind(&transaction.failure_reason)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn list_for_order(
        &self,
        order_id: &str,
    ) -> Result<Vec<PaymentTransaction>, DatabaseError> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions \
             WHERE order_id = $1 ORDER BY created_at DESC"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}

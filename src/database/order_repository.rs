use crate::database::error::DatabaseError;
use crate::database::new_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use std::str::FromStr;

/// Order lifecycle. Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Draft")]
    Draft,
    #[serde(rename = "Processing")]
    Processing,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "Draft",
            OrderStatus::Processing => "Processing",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        *self == next || !self.is_terminal()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Draft" => Ok(OrderStatus::Draft),
            "Processing" => Ok(OrderStatus::Processing),
            "In Progress" => Ok(OrderStatus::InProgress),
            "Completed" => Ok(OrderStatus::Completed),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Paid")]
    Paid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    #[serde(rename = "Refunded")]
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::PartiallyPaid => "Partially Paid",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Dispatched")]
    Dispatched,
    #[serde(rename = "Delivered")]
    Delivered,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "Pending",
            DeliveryStatus::Dispatched => "Dispatched",
            DeliveryStatus::Delivered => "Delivered",
        }
    }
}

/// Order entity
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub requirements: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub amount: f64,
    pub status: String,
    pub payment_status: String,
    pub delivery_status: String,
    pub progress: i32,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Stored status parsed into the lifecycle enum
    pub fn lifecycle(&self) -> Result<OrderStatus, String> {
        self.status.parse()
    }
}

/// Fields accepted when a customer submits an order
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub requirements: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub amount: f64,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub requirements: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub amount: Option<f64>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub delivery_status: Option<DeliveryStatus>,
    pub progress: Option<i32>,
    pub admin_notes: Option<String>,
}

impl OrderPatch {
    /// True when the patch touches any state the owner is notified about
    pub fn changes_state(&self) -> bool {
        self.status.is_some() || self.payment_status.is_some() || self.delivery_status.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<String>,
    pub status: Option<String>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DatabaseError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, DatabaseError>;

    async fn insert(&self, order: &NewOrder) -> Result<Order, DatabaseError>;

    /// Apply a partial update, returning `None` when the order does not exist
    async fn update(&self, id: &str, patch: &OrderPatch) -> Result<Option<Order>, DatabaseError>;

    /// Overwrite status and payment status, as done after a verified payment
    async fn set_payment_state(
        &self,
        id: &str,
        status: OrderStatus,
        payment_status: PaymentStatus,
    ) -> Result<Option<Order>, DatabaseError>;

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError>;
}

const ORDER_COLUMNS: &str = "id, user_id, title, description, project_type, requirements, deadline, \
     amount, status, payment_status, delivery_status, progress, admin_notes, created_at, updated_at";

/// Postgres-backed order repository
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::text IS NULL OR user_id = $1) AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(&filter.user_id)
        .bind(&filter.status)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
    }

    async fn insert(&self, order: &NewOrder) -> Result<Order, DatabaseError> {
        sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders \
             (id, user_id, title, description, project_type, requirements, deadline, amount, \
              status, payment_status, delivery_status, progress, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 0, NOW(), NOW()) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new_id())
        .bind(&order.user_id)
        .bind(&order.title)
        .bind(&order.description)
        .bind(&order.project_type)
        .bind(&order.requirements)
        .bind(order.deadline)
        .bind(order.amount)
        .bind(OrderStatus::Draft.as_str())
        .bind(PaymentStatus::Pending.as_str())
        .bind(DeliveryStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn update(&self, id: &str, patch: &OrderPatch) -> Result<Option<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET \
               title = COALESCE($2, title), \
               description = COALESCE($3, description), \
               project_type = COALESCE($4, project_type), \
               requirements = COALESCE($5, requirements), \
               deadline = COALESCE($6, deadline), \
               amount = COALESCE($7, amount), \
               status = COALESCE($8, status), \
               payment_status = COALESCE($9, payment_status), \
               delivery_status = COALESCE($10, delivery_status), \
               progress = COALESCE($11, progress), \
               admin_notes = COALESCE($12, admin_notes), \
               updated_at = NOW() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.project_type)
        .bind(&patch.requirements)
        .bind(patch.deadline)
        .bind(patch.amount)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.payment_status.map(|s| s.as_str()))
        .bind(patch.delivery_status.map(|s| s.as_str()))
        .bind(patch.progress)
        .bind(&patch.admin_notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn set_payment_state(
        &self,
        id: &str,
        status: OrderStatus,
        payment_status: PaymentStatus,
    ) -> Result<Option<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, payment_status = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(payment_status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            OrderStatus::Draft,
            OrderStatus::Processing,
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("processing".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_terminal_states_are_frozen() {
        assert!(OrderStatus::Draft.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::InProgress));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Draft));
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_patch_rejects_unknown_status_text() {
        let patch: Result<OrderPatch, _> =
            serde_json::from_value(serde_json::json!({ "status": "Shipped" }));
        assert!(patch.is_err());

        let patch: OrderPatch =
            serde_json::from_value(serde_json::json!({ "status": "In Progress", "progress": 40 }))
                .unwrap();
        assert_eq!(patch.status, Some(OrderStatus::InProgress));
        assert!(patch.changes_state());
    }

    #[test]
    fn test_payment_status_serializes_with_spaces() {
        let value = serde_json::to_value(PaymentStatus::PartiallyPaid).unwrap();
        assert_eq!(value, serde_json::json!("Partially Paid"));
    }
}

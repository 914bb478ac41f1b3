use crate::database::error::DatabaseError;
use crate::database::new_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Order,
    Payment,
    Task,
    Invoice,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Order => "order",
            NotificationKind::Payment => "payment",
            NotificationKind::Task => "task",
            NotificationKind::Invoice => "invoice",
            NotificationKind::System => "system",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub message: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub order_id: Option<String>,
    pub task_id: Option<String>,
    pub invoice_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub order_id: Option<String>,
    pub task_id: Option<String>,
    pub invoice_id: Option<String>,
}

impl NewNotification {
    pub fn new(user_id: impl Into<String>, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            kind,
            order_id: None,
            task_id: None,
            invoice_id: None,
        }
    }

    pub fn for_order(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn for_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn for_invoice(mut self, invoice_id: impl Into<String>) -> Self {
        self.invoice_id = Some(invoice_id.into());
        self
    }
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert one row per notification, returning how many were written
    async fn insert_many(&self, notifications: &[NewNotification]) -> Result<u64, DatabaseError>;

    async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, DatabaseError>;

    /// Mark the given ids (or every notification when `ids` is `None`) as read
    async fn mark_read(&self, user_id: &str, ids: Option<&[String]>) -> Result<u64, DatabaseError>;

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, DatabaseError>;
}

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, message, type, order_id, task_id, invoice_id, is_read, created_at";

pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert_many(&self, notifications: &[NewNotification]) -> Result<u64, DatabaseError> {
        if notifications.is_empty() {
            return Ok(0);
        }

        let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "INSERT INTO notifications (id, user_id, message, type, order_id, task_id, invoice_id, is_read, created_at) ",
        );
        builder.push_values(notifications, |mut row, n| {
            row.push_bind(new_id())
                .push_bind(&n.user_id)
                .push_bind(&n.message)
                .push_bind(n.kind.as_str())
                .push_bind(&n.order_id)
                .push_bind(&n.task_id)
                .push_bind(&n.invoice_id)
                .push_bind(false)
                .push("NOW()");
        });

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, DatabaseError> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE user_id = $1 AND ($2 = false OR is_read = false) \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn mark_read(&self, user_id: &str, ids: Option<&[String]>) -> Result<u64, DatabaseError> {
        let result = match ids {
            Some(ids) => {
                sqlx::query(
                    "UPDATE notifications SET is_read = true WHERE user_id = $1 AND id = ANY($2)",
                )
                .bind(user_id)
                .bind(ids)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query("UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false")
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

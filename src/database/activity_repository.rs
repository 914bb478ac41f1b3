use crate::database::error::DatabaseError;
use crate::database::new_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Audit trail entry written after every gated mutation
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: Option<serde_json::Value>,
}

#[async_trait]
pub trait ActivityLogStore: Send + Sync {
    async fn record(&self, activity: &NewActivity) -> Result<(), DatabaseError>;

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLog>, DatabaseError>;
}

pub struct ActivityLogRepository {
    pool: PgPool,
}

impl ActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogStore for ActivityLogRepository {
    async fn record(&self, activity: &NewActivity) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO activity_logs (id, user_id, action, entity_type, entity_id, details, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW())",
        )
        .bind(new_id())
        .bind(&activity.user_id)
        .bind(&activity.action)
        .bind(&activity.entity_type)
        .bind(&activity.entity_id)
        .bind(&activity.details)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLog>, DatabaseError> {
        sqlx::query_as::<_, ActivityLog>(
            "SELECT id, user_id, action, entity_type, entity_id, details, created_at \
             FROM activity_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}

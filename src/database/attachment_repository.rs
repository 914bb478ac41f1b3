use crate::database::error::DatabaseError;
use crate::database::new_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Metadata for a file uploaded to object storage
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub order_id: String,
    pub uploaded_by: String,
    pub file_name: String,
    pub storage_path: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub order_id: String,
    pub uploaded_by: String,
    pub file_name: String,
    pub storage_path: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn list_for_order(&self, order_id: &str) -> Result<Vec<Attachment>, DatabaseError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Attachment>, DatabaseError>;

    async fn insert(&self, attachment: &NewAttachment) -> Result<Attachment, DatabaseError>;

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError>;
}

const ATTACHMENT_COLUMNS: &str =
    "id, order_id, uploaded_by, file_name, storage_path, content_type, size_bytes, created_at";

pub struct AttachmentRepository {
    pool: PgPool,
}

impl AttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentStore for AttachmentRepository {
    async fn list_for_order(&self, order_id: &str) -> Result<Vec<Attachment>, DatabaseError> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE order_id = $1 ORDER BY created_at DESC"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Attachment>, DatabaseError> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn insert(&self, attachment: &NewAttachment) -> Result<Attachment, DatabaseError> {
        sqlx::query_as::<_, Attachment>(&format!(
            "INSERT INTO attachments \
             (id, order_id, uploaded_by, file_name, storage_path, content_type, size_bytes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) RETURNING {ATTACHMENT_COLUMNS}"
        ))
        .bind(new_id())
        .bind(&attachment.order_id)
        .bind(&attachment.uploaded_by)
        .bind(&attachment.file_name)
        .bind(&attachment.storage_path)
        .bind(&attachment.content_type)
        .bind(attachment.size_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

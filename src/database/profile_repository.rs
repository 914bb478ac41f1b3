use crate::auth::roles::Role;
use crate::database::error::DatabaseError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Profile row keyed by the auth provider's user id
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilePatch {
    pub role: Option<Role>,
    pub full_name: Option<String>,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError>;

    async fn list(&self) -> Result<Vec<UserProfile>, DatabaseError>;

    async fn user_ids_with_role(&self, role: Role) -> Result<Vec<String>, DatabaseError>;

    async fn update(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<UserProfile>, DatabaseError>;
}

const PROFILE_COLUMNS: &str = "user_id, email, full_name, role, created_at, updated_at";

pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn find(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn list(&self) -> Result<Vec<UserProfile>, DatabaseError> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn user_ids_with_role(&self, role: Role) -> Result<Vec<String>, DatabaseError> {
        sqlx::query_scalar::<_, String>("SELECT user_id FROM user_profiles WHERE role = $1")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
    }

    async fn update(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<UserProfile>, DatabaseError> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE user_profiles SET \
               role = COALESCE($2, role), \
               full_name = COALESCE($3, full_name), \
               updated_at = NOW() \
             WHERE user_id = $1 RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(patch.role.map(|r| r.as_str()))
        .bind(&patch.full_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}

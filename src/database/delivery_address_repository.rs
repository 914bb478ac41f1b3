use crate::database::error::DatabaseError;
use crate::database::new_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub id: String,
    pub order_id: String,
    pub recipient_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
}

/// Address fields as submitted alongside a new order
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub recipient_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl AddressInput {
    /// Names of required fields left blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("recipient_name", &self.recipient_name),
            ("phone", &self.phone),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[async_trait]
pub trait DeliveryAddressStore: Send + Sync {
    async fn insert(
        &self,
        order_id: &str,
        address: &AddressInput,
    ) -> Result<DeliveryAddress, DatabaseError>;

    async fn find_for_order(&self, order_id: &str)
        -> Result<Option<DeliveryAddress>, DatabaseError>;
}

const ADDRESS_COLUMNS: &str = "id, order_id, recipient_name, phone, address_line1, address_line2, \
     city, state, postal_code, created_at";

pub struct DeliveryAddressRepository {
    pool: PgPool,
}

impl DeliveryAddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryAddressStore for DeliveryAddressRepository {
    async fn insert(
        &self,
        order_id: &str,
        address: &AddressInput,
    ) -> Result<DeliveryAddress, DatabaseError> {
        sqlx::query_as::<_, DeliveryAddress>(&format!(
            "INSERT INTO delivery_addresses \
             (id, order_id, recipient_name, phone, address_line1, address_line2, city, state, \
              postal_code, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(new_id())
        .bind(order_id)
        .bind(&address.recipient_name)
        .bind(&address.phone)
        .bind(&address.address_line1)
        .bind(&address.address_line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.postal_code)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_for_order(
        &self,
        order_id: &str,
    ) -> Result<Option<DeliveryAddress>, DatabaseError> {
        sqlx::query_as::<_, DeliveryAddress>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM delivery_addresses \
             WHERE order_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}

//! Shared application state handed to every handler

use crate::auth::TokenVerifier;
use crate::database::activity_repository::{ActivityLogRepository, ActivityLogStore};
use crate::database::attachment_repository::{AttachmentRepository, AttachmentStore};
use crate::database::delivery_address_repository::{
    DeliveryAddressRepository, DeliveryAddressStore,
};
use crate::database::invoice_repository::{InvoiceRepository, InvoiceStore};
use crate::database::notification_repository::{NotificationRepository, NotificationStore};
use crate::database::order_repository::{OrderRepository, OrderStore};
use crate::database::payment_transaction_repository::{
    PaymentTransactionRepository, PaymentTransactionStore,
};
use crate::database::profile_repository::{ProfileRepository, ProfileStore};
use crate::database::task_repository::{TaskRepository, TaskStore};
use crate::invoicing::InvoiceSync;
use crate::payments::PaymentGateway;
use sqlx::PgPool;
use std::sync::Arc;

/// One handle per table
#[derive(Clone)]
pub struct Stores {
    pub orders: Arc<dyn OrderStore>,
    pub transactions: Arc<dyn PaymentTransactionStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub activity: Arc<dyn ActivityLogStore>,
    pub attachments: Arc<dyn AttachmentStore>,
    pub addresses: Arc<dyn DeliveryAddressStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            orders: Arc::new(OrderRepository::new(pool.clone())),
            transactions: Arc::new(PaymentTransactionRepository::new(pool.clone())),
            invoices: Arc::new(InvoiceRepository::new(pool.clone())),
            tasks: Arc::new(TaskRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            profiles: Arc::new(ProfileRepository::new(pool.clone())),
            activity: Arc::new(ActivityLogRepository::new(pool.clone())),
            attachments: Arc::new(AttachmentRepository::new(pool.clone())),
            addresses: Arc::new(DeliveryAddressRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub gateway: Arc<dyn PaymentGateway>,
    pub invoicing: InvoiceSync,
    pub tokens: Arc<TokenVerifier>,
    /// Currency recorded on payment transactions and new invoices
    pub currency: String,
    pub environment: String,
    /// Present when running against Postgres; used by the health check
    pub pool: Option<PgPool>,
}

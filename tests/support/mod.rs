//! Shared fixtures for the router-level tests: an in-memory store behind
//! every store trait, a scriptable remote invoicing backend and helpers
//! that drive requests through the real router.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use chrono::Utc;
use http::{Method, Request, StatusCode};
use jsonwebtoken::{encode, EncodingKey, Header};
use projectdesk_backend::auth::roles::Role;
use projectdesk_backend::auth::TokenVerifier;
use projectdesk_backend::database::activity_repository::{ActivityLog, ActivityLogStore, NewActivity};
use projectdesk_backend::database::attachment_repository::{
    Attachment, AttachmentStore, NewAttachment,
};
use projectdesk_backend::database::delivery_address_repository::{
    AddressInput, DeliveryAddress, DeliveryAddressStore,
};
use projectdesk_backend::database::error::{DatabaseError, DatabaseErrorKind};
use projectdesk_backend::database::invoice_repository::{
    Invoice, InvoiceFilter, InvoiceStatus, InvoiceStore, NewInvoice,
};
use projectdesk_backend::database::notification_repository::{
    NewNotification, Notification, NotificationStore,
};
use projectdesk_backend::database::order_repository::{
    NewOrder, Order, OrderFilter, OrderPatch, OrderStatus, OrderStore, PaymentStatus,
};
use projectdesk_backend::database::payment_transaction_repository::{
    NewPaymentTransaction, PaymentTransaction, PaymentTransactionStore,
};
use projectdesk_backend::database::profile_repository::{ProfilePatch, ProfileStore, UserProfile};
use projectdesk_backend::database::task_repository::{
    NewTask, Task, TaskFilter, TaskPatch, TaskStatus, TaskStore,
};
use projectdesk_backend::error::AppResult;
use projectdesk_backend::invoicing::{InvoiceSync, RemoteCustomer, RemoteInvoicing};
use projectdesk_backend::payments::providers::{RazorpayConfig, RazorpayProvider};
use projectdesk_backend::{api, AppError, AppState, Stores};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-session-secret";
pub const RAZORPAY_SECRET: &str = "test-razorpay-secret";

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Default)]
pub struct MemoryStore {
    pub orders: Mutex<Vec<Order>>,
    pub transactions: Mutex<Vec<PaymentTransaction>>,
    pub invoices: Mutex<Vec<Invoice>>,
    pub tasks: Mutex<Vec<Task>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub profiles: Mutex<Vec<UserProfile>>,
    pub activity: Mutex<Vec<ActivityLog>>,
    pub attachments: Mutex<Vec<Attachment>>,
    pub addresses: Mutex<Vec<DeliveryAddress>>,
    /// Makes `OrderStore::set_payment_state` fail like a dropped connection
    pub fail_payment_update: AtomicBool,
}

impl MemoryStore {
    pub fn seed_profile(&self, user_id: &str, role: Role, email: Option<&str>) {
        let now = Utc::now();
        self.profiles.lock().unwrap().push(UserProfile {
            user_id: user_id.to_string(),
            email: email.map(str::to_string),
            full_name: Some(format!("User {}", user_id)),
            role: role.as_str().to_string(),
            created_at: now,
            updated_at: now,
        });
    }

    pub fn seed_order(&self, user_id: &str, status: OrderStatus, amount: f64) -> Order {
        let now = Utc::now();
        let order = Order {
            id: new_id(),
            user_id: user_id.to_string(),
            title: "Smart irrigation controller".to_string(),
            description: Some("ESP32 with soil moisture sensors".to_string()),
            project_type: Some("IoT".to_string()),
            requirements: None,
            deadline: None,
            amount,
            status: status.as_str().to_string(),
            payment_status: PaymentStatus::Pending.as_str().to_string(),
            delivery_status: "Pending".to_string(),
            progress: 0,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };
        self.orders.lock().unwrap().push(order.clone());
        order
    }

    pub fn order(&self, id: &str) -> Option<Order> {
        self.orders.lock().unwrap().iter().find(|o| o.id == id).cloned()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.lock().unwrap().len()
    }

    pub fn notifications_for(&self, user_id: &str) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DatabaseError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| filter.user_id.as_ref().map_or(true, |u| &o.user_id == u))
            .filter(|o| filter.status.as_ref().map_or(true, |s| &o.status == s))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, DatabaseError> {
        Ok(self.order(id))
    }

    async fn insert(&self, order: &NewOrder) -> Result<Order, DatabaseError> {
        let now = Utc::now();
        let order = Order {
            id: new_id(),
            user_id: order.user_id.clone(),
            title: order.title.clone(),
            description: order.description.clone(),
            project_type: order.project_type.clone(),
            requirements: order.requirements.clone(),
            deadline: order.deadline,
            amount: order.amount,
            status: OrderStatus::Draft.as_str().to_string(),
            payment_status: PaymentStatus::Pending.as_str().to_string(),
            delivery_status: "Pending".to_string(),
            progress: 0,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };
        self.orders.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn update(&self, id: &str, patch: &OrderPatch) -> Result<Option<Order>, DatabaseError> {
        let mut orders = self.orders.lock().unwrap();
        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };

        if let Some(title) = &patch.title {
            order.title = title.clone();
        }
        if let Some(description) = &patch.description {
            order.description = Some(description.clone());
        }
        if let Some(project_type) = &patch.project_type {
            order.project_type = Some(project_type.clone());
        }
        if let Some(requirements) = &patch.requirements {
            order.requirements = Some(requirements.clone());
        }
        if let Some(deadline) = patch.deadline {
            order.deadline = Some(deadline);
        }
        if let Some(amount) = patch.amount {
            order.amount = amount;
        }
        if let Some(status) = patch.status {
            order.status = status.as_str().to_string();
        }
        if let Some(payment_status) = patch.payment_status {
            order.payment_status = payment_status.as_str().to_string();
        }
        if let Some(delivery_status) = patch.delivery_status {
            order.delivery_status = delivery_status.as_str().to_string();
        }
        if let Some(progress) = patch.progress {
            order.progress = progress;
        }
        if let Some(notes) = &patch.admin_notes {
            order.admin_notes = Some(notes.clone());
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn set_payment_state(
        &self,
        id: &str,
        status: OrderStatus,
        payment_status: PaymentStatus,
    ) -> Result<Option<Order>, DatabaseError> {
        if self.fail_payment_update.load(Ordering::SeqCst) {
            return Err(DatabaseError::new(DatabaseErrorKind::QueryError {
                message: "connection reset by peer".to_string(),
            }));
        }
        let mut orders = self.orders.lock().unwrap();
        Ok(orders.iter_mut().find(|o| o.id == id).map(|order| {
            order.status = status.as_str().to_string();
            order.payment_status = payment_status.as_str().to_string();
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let mut orders = self.orders.lock().unwrap();
        let before = orders.len();
        orders.retain(|o| o.id != id);
        Ok(orders.len() < before)
    }
}

#[async_trait]
impl PaymentTransactionStore for MemoryStore {
    async fn insert(
        &self,
        transaction: &NewPaymentTransaction,
    ) -> Result<PaymentTransaction, DatabaseError> {
        let row = PaymentTransaction {
            id: new_id(),
            user_id: transaction.user_id.clone(),
            order_id: transaction.order_id.clone(),
            gateway_order_id: transaction.gateway_order_id.clone(),
            gateway_payment_id: transaction.gateway_payment_id.clone(),
            amount: transaction.amount,
            currency: transaction.currency.clone(),
            status: transaction.status.as_str().to_string(),
            failure_reason: transaction.failure_reason.clone(),
            created_at: Utc::now(),
        };
        self.transactions.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_for_order(
        &self,
        order_id: &str,
    ) -> Result<Vec<PaymentTransaction>, DatabaseError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, DatabaseError> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .filter(|i| filter.user_id.as_ref().map_or(true, |u| &i.user_id == u))
            .filter(|i| filter.order_id.as_ref().map_or(true, |o| &i.order_id == o))
            .filter(|i| filter.status.as_ref().map_or(true, |s| &i.status == s))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Invoice>, DatabaseError> {
        Ok(self.invoices.lock().unwrap().iter().find(|i| i.id == id).cloned())
    }

    async fn insert(&self, invoice: &NewInvoice) -> Result<Invoice, DatabaseError> {
        let now = Utc::now();
        let row = Invoice {
            id: new_id(),
            invoice_number: invoice.invoice_number.clone(),
            order_id: invoice.order_id.clone(),
            user_id: invoice.user_id.clone(),
            line_items: sqlx::types::Json(invoice.line_items.clone()),
            subtotal: invoice.totals.subtotal,
            tax_total: invoice.totals.tax_total,
            discount: invoice.totals.discount,
            total: invoice.totals.total,
            currency: invoice.currency.clone(),
            status: InvoiceStatus::Draft.as_str().to_string(),
            due_date: invoice.due_date,
            notes: invoice.notes.clone(),
            external_id: None,
            created_at: now,
            updated_at: now,
        };
        self.invoices.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(&self, invoice: &Invoice) -> Result<Option<Invoice>, DatabaseError> {
        let mut invoices = self.invoices.lock().unwrap();
        Ok(invoices.iter_mut().find(|i| i.id == invoice.id).map(|row| {
            *row = Invoice {
                updated_at: Utc::now(),
                ..invoice.clone()
            };
            row.clone()
        }))
    }

    async fn set_status(
        &self,
        id: &str,
        status: InvoiceStatus,
    ) -> Result<Option<Invoice>, DatabaseError> {
        let mut invoices = self.invoices.lock().unwrap();
        Ok(invoices.iter_mut().find(|i| i.id == id).map(|row| {
            row.status = status.as_str().to_string();
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let mut invoices = self.invoices.lock().unwrap();
        let before = invoices.len();
        invoices.retain(|i| i.id != id);
        Ok(invoices.len() < before)
    }

    async fn latest_number(&self, prefix: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.invoice_number.clone())
            .filter(|n| n.starts_with(prefix))
            .max_by_key(|n| (n.len(), n.clone())))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, DatabaseError> {
        let orders = self.orders.lock().unwrap().clone();
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| filter.order_id.as_ref().map_or(true, |o| &t.order_id == o))
            .filter(|t| {
                filter
                    .assigned_to
                    .as_ref()
                    .map_or(true, |a| t.assigned_to.as_ref() == Some(a))
            })
            .filter(|t| {
                filter.order_owner.as_ref().map_or(true, |owner| {
                    orders
                        .iter()
                        .any(|o| o.id == t.order_id && &o.user_id == owner)
                })
            })
            .filter(|t| filter.status.as_ref().map_or(true, |s| &t.status == s))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        Ok(self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn insert(&self, task: &NewTask) -> Result<Task, DatabaseError> {
        let now = Utc::now();
        let row = Task {
            id: new_id(),
            order_id: task.order_id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            assigned_to: task.assigned_to.clone(),
            status: TaskStatus::Todo.as_str().to_string(),
            priority: task.priority.as_str().to_string(),
            due_date: task.due_date,
            created_by: task.created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        self.tasks.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, DatabaseError> {
        let mut tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter_mut().find(|t| t.id == id).map(|task| {
            if let Some(title) = &patch.title {
                task.title = title.clone();
            }
            if let Some(description) = &patch.description {
                task.description = Some(description.clone());
            }
            if let Some(assigned_to) = &patch.assigned_to {
                task.assigned_to = Some(assigned_to.clone());
            }
            if let Some(status) = patch.status {
                task.status = status.as_str().to_string();
            }
            if let Some(priority) = patch.priority {
                task.priority = priority.as_str().to_string();
            }
            if let Some(due_date) = patch.due_date {
                task.due_date = Some(due_date);
            }
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        Ok(tasks.len() < before)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_many(&self, notifications: &[NewNotification]) -> Result<u64, DatabaseError> {
        let mut rows = self.notifications.lock().unwrap();
        for n in notifications {
            rows.push(Notification {
                id: new_id(),
                user_id: n.user_id.clone(),
                message: n.message.clone(),
                kind: n.kind.as_str().to_string(),
                order_id: n.order_id.clone(),
                task_id: n.task_id.clone(),
                invoice_id: n.invoice_id.clone(),
                is_read: false,
                created_at: Utc::now(),
            });
        }
        Ok(notifications.len() as u64)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, DatabaseError> {
        Ok(self
            .notifications_for(user_id)
            .into_iter()
            .filter(|n| !unread_only || !n.is_read)
            .collect())
    }

    async fn mark_read(&self, user_id: &str, ids: Option<&[String]>) -> Result<u64, DatabaseError> {
        let mut count = 0;
        for n in self.notifications.lock().unwrap().iter_mut() {
            if n.user_id == user_id && !n.is_read && ids.map_or(true, |ids| ids.contains(&n.id)) {
                n.is_read = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, DatabaseError> {
        let mut rows = self.notifications.lock().unwrap();
        let before = rows.len();
        rows.retain(|n| !(n.id == id && n.user_id == user_id));
        Ok(rows.len() < before)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserProfile>, DatabaseError> {
        Ok(self.profiles.lock().unwrap().clone())
    }

    async fn user_ids_with_role(&self, role: Role) -> Result<Vec<String>, DatabaseError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.role == role.as_str())
            .map(|p| p.user_id.clone())
            .collect())
    }

    async fn update(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<UserProfile>, DatabaseError> {
        let mut profiles = self.profiles.lock().unwrap();
        Ok(profiles.iter_mut().find(|p| p.user_id == user_id).map(|profile| {
            if let Some(role) = patch.role {
                profile.role = role.as_str().to_string();
            }
            if let Some(name) = &patch.full_name {
                profile.full_name = Some(name.clone());
            }
            profile.updated_at = Utc::now();
            profile.clone()
        }))
    }
}

#[async_trait]
impl ActivityLogStore for MemoryStore {
    async fn record(&self, activity: &NewActivity) -> Result<(), DatabaseError> {
        self.activity.lock().unwrap().push(ActivityLog {
            id: new_id(),
            user_id: activity.user_id.clone(),
            action: activity.action.clone(),
            entity_type: activity.entity_type.clone(),
            entity_id: activity.entity_id.clone(),
            details: activity.details.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLog>, DatabaseError> {
        let rows = self.activity.lock().unwrap();
        Ok(rows.iter().rev().take(limit as usize).cloned().collect())
    }
}

#[async_trait]
impl AttachmentStore for MemoryStore {
    async fn list_for_order(&self, order_id: &str) -> Result<Vec<Attachment>, DatabaseError> {
        Ok(self
            .attachments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Attachment>, DatabaseError> {
        Ok(self.attachments.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, attachment: &NewAttachment) -> Result<Attachment, DatabaseError> {
        let row = Attachment {
            id: new_id(),
            order_id: attachment.order_id.clone(),
            uploaded_by: attachment.uploaded_by.clone(),
            file_name: attachment.file_name.clone(),
            storage_path: attachment.storage_path.clone(),
            content_type: attachment.content_type.clone(),
            size_bytes: attachment.size_bytes,
            created_at: Utc::now(),
        };
        self.attachments.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let mut rows = self.attachments.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() < before)
    }
}

#[async_trait]
impl DeliveryAddressStore for MemoryStore {
    async fn insert(
        &self,
        order_id: &str,
        address: &AddressInput,
    ) -> Result<DeliveryAddress, DatabaseError> {
        let row = DeliveryAddress {
            id: new_id(),
            order_id: order_id.to_string(),
            recipient_name: address.recipient_name.clone(),
            phone: address.phone.clone(),
            address_line1: address.address_line1.clone(),
            address_line2: address.address_line2.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            created_at: Utc::now(),
        };
        self.addresses.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn find_for_order(
        &self,
        order_id: &str,
    ) -> Result<Option<DeliveryAddress>, DatabaseError> {
        Ok(self
            .addresses
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|a| a.order_id == order_id)
            .cloned())
    }
}

/// Remote invoicing double; `failing` makes every call error out
#[derive(Default)]
pub struct FakeInvoicing {
    pub failing: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeInvoicing {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, name: &str) -> AppResult<()> {
        self.calls.lock().unwrap().push(name.to_string());
        if self.failing {
            return Err(AppError::invoicing("Fake Books", "service unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteInvoicing for FakeInvoicing {
    fn name(&self) -> &'static str {
        "Fake Books"
    }

    async fn create_invoice(&self, invoice: &Invoice, _customer: &RemoteCustomer) -> AppResult<String> {
        self.call("create")?;
        Ok(format!("ext-{}", invoice.invoice_number))
    }

    async fn update_invoice(&self, _external_id: &str, _invoice: &Invoice) -> AppResult<()> {
        self.call("update")
    }

    async fn fetch_status(&self, _external_id: &str) -> AppResult<InvoiceStatus> {
        self.call("status")?;
        Ok(InvoiceStatus::Sent)
    }

    async fn send_invoice(&self, _external_id: &str, _customer: &RemoteCustomer) -> AppResult<()> {
        self.call("send")
    }

    async fn mark_paid(&self, _external_id: &str, _invoice: &Invoice) -> AppResult<()> {
        self.call("mark_paid")
    }

    async fn fetch_pdf(&self, _external_id: &str) -> AppResult<Vec<u8>> {
        self.call("pdf")?;
        Ok(b"%PDF-1.4 fake".to_vec())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_invoicing(InvoiceSync::disabled())
    }

    pub fn with_remote(remote: Arc<FakeInvoicing>) -> Self {
        Self::with_invoicing(InvoiceSync::new(remote))
    }

    fn with_invoicing(invoicing: InvoiceSync) -> Self {
        let store = Arc::new(MemoryStore::default());
        let gateway = RazorpayProvider::new(RazorpayConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: RAZORPAY_SECRET.to_string(),
            ..Default::default()
        })
        .expect("test gateway builds");

        let state = AppState {
            stores: Stores {
                orders: store.clone(),
                transactions: store.clone(),
                invoices: store.clone(),
                tasks: store.clone(),
                notifications: store.clone(),
                profiles: store.clone(),
                activity: store.clone(),
                attachments: store.clone(),
                addresses: store.clone(),
            },
            gateway: Arc::new(gateway),
            invoicing,
            tokens: Arc::new(TokenVerifier::new(JWT_SECRET, None)),
            currency: "INR".to_string(),
            environment: "test".to_string(),
            pool: None,
        };

        Self { state, store }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header("authorization", format!("Bearer {}", token(user_id)));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = api::router(self.state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

/// Session token for `user_id`, valid for ten minutes
pub fn token(user_id: &str) -> String {
    let exp = (Utc::now().timestamp() + 600) as usize;
    let claims = serde_json::json!({
        "sub": user_id,
        "exp": exp,
        "email": format!("{}@example.test", user_id),
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

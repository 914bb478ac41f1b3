//! HTTP surface: route table, request tracing and helpers shared by handlers

pub mod activity;
pub mod attachments;
pub mod health;
pub mod invoices;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod tasks;
pub mod users;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post, put};
use axum::Router;
use http::HeaderName;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/createOrder", post(payments::create_order))
        .route("/api/verifyOrder", post(payments::verify_order))
        .route("/api/orders", get(orders::list_orders).post(orders::create_order))
        .route(
            "/api/orders/:id",
            get(orders::get_order)
                .put(orders::update_order)
                .delete(orders::delete_order),
        )
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/api/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route(
            "/api/invoices/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route("/api/invoices/:id/send", post(invoices::send_invoice))
        .route("/api/invoices/:id/pdf", get(invoices::download_pdf))
        .route(
            "/api/notifications",
            get(notifications::list_notifications)
                .post(notifications::create_notifications)
                .patch(notifications::mark_read)
                .delete(notifications::delete_notification),
        )
        .route(
            "/api/attachments",
            get(attachments::list_attachments)
                .post(attachments::create_attachment)
                .delete(attachments::delete_attachment),
        )
        .route("/api/users", get(users::list_users))
        .route("/api/users/me", get(users::current_user))
        .route("/api/users/:id", put(users::update_user))
        .route("/api/activity-logs", get(activity::list_activity))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}

/// Unwrap a JSON body, turning extractor rejections into a 400
pub(crate) fn json_body<T>(body: Result<axum::Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|axum::Json(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

/// Update bodies arrive as raw objects so field names can be checked against
/// the role allowlist before they are typed
pub(crate) fn patch_object(body: Result<axum::Json<Value>, JsonRejection>) -> AppResult<Map<String, Value>> {
    match json_body(body)? {
        Value::Object(map) if !map.is_empty() => Ok(map),
        Value::Object(_) => Err(AppError::validation("update body is empty")),
        _ => Err(AppError::validation("update body must be a JSON object")),
    }
}

pub(crate) fn typed_patch<T: DeserializeOwned>(map: Map<String, Value>) -> AppResult<T> {
    serde_json::from_value(Value::Object(map)).map_err(|e| AppError::validation(e.to_string()))
}

pub(crate) fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(())
}

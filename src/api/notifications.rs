use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{json_body, require_text};
use crate::auth::roles::{Action, Resource, Role};
use crate::auth::AuthenticatedUser;
use crate::database::notification_repository::{NewNotification, Notification, NotificationKind};
use crate::error::{AppError, AppResult};
use crate::events;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

/// Admin-authored notification. Recipients are explicit user ids, every user
/// holding `role`, or both.
#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    #[serde(default)]
    pub user_ids: Vec<String>,
    pub role: Option<Role>,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<NotificationKind>,
    pub order_id: Option<String>,
    pub task_id: Option<String>,
    pub invoice_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkReadRequest {
    /// Ids to mark; omitted means every notification of the caller
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let actor = user
        .authorize(&state, Resource::Notifications, Action::List)
        .await?;

    Ok(Json(
        state
            .stores
            .notifications
            .list_for_user(&actor.user_id, query.unread)
            .await?,
    ))
}

pub async fn create_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateNotificationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CountResponse>)> {
    let actor = user
        .authorize(&state, Resource::Notifications, Action::Create)
        .await?;
    let request = json_body(body)?;
    require_text("message", &request.message)?;

    let mut recipients = request.user_ids;
    if let Some(role) = request.role {
        recipients.extend(state.stores.profiles.user_ids_with_role(role).await?);
    }
    recipients.sort_unstable();
    recipients.dedup();

    if recipients.is_empty() {
        return Err(AppError::validation("no recipients: give user_ids or a role"));
    }

    let kind = request.kind.unwrap_or(NotificationKind::System);
    let notifications: Vec<NewNotification> = recipients
        .into_iter()
        .map(|user_id| NewNotification {
            user_id,
            message: request.message.clone(),
            kind,
            order_id: request.order_id.clone(),
            task_id: request.task_id.clone(),
            invoice_id: request.invoice_id.clone(),
        })
        .collect();

    let count = state.stores.notifications.insert_many(&notifications).await?;

    events::record_activity(
        &state,
        &actor.user_id,
        "create_notifications",
        "notification",
        "broadcast",
        Some(serde_json::json!({ "recipients": count })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(CountResponse { count })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Bytes,
) -> AppResult<Json<CountResponse>> {
    let actor = user
        .authorize(&state, Resource::Notifications, Action::Update)
        .await?;
    let request = mark_read_request(&body)?;

    let count = state
        .stores
        .notifications
        .mark_read(&actor.user_id, request.ids.as_deref())
        .await?;

    Ok(Json(CountResponse { count }))
}

/// An empty body marks everything read. Anything else must parse, so a
/// malformed id list never widens into "all".
fn mark_read_request(body: &[u8]) -> AppResult<MarkReadRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(MarkReadRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Invalid request body: {}", e)))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<DeleteQuery>,
) -> AppResult<StatusCode> {
    let actor = user
        .authorize(&state, Resource::Notifications, Action::Delete)
        .await?;
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::validation("id query parameter is required"))?;

    if !state.stores.notifications.delete(&actor.user_id, &id).await? {
        return Err(AppError::not_found("Notification"));
    }
    Ok(StatusCode::NO_CONTENT)
}

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::orders::visible_order;
use crate::api::{json_body, require_text};
use crate::auth::roles::{Action, Resource};
use crate::auth::AuthenticatedUser;
use crate::database::attachment_repository::{Attachment, NewAttachment};
use crate::error::{AppError, AppResult};
use crate::events;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

/// Metadata for a file already placed in object storage
#[derive(Debug, Deserialize)]
pub struct CreateAttachmentRequest {
    pub order_id: String,
    pub file_name: String,
    pub storage_path: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
}

pub async fn list_attachments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Attachment>>> {
    let actor = user
        .authorize(&state, Resource::Attachments, Action::List)
        .await?;
    let order_id = query
        .order_id
        .ok_or_else(|| AppError::validation("orderId query parameter is required"))?;

    let order = visible_order(&state, &actor, &order_id).await?;
    Ok(Json(state.stores.attachments.list_for_order(&order.id).await?))
}

pub async fn create_attachment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateAttachmentRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Attachment>)> {
    let actor = user
        .authorize(&state, Resource::Attachments, Action::Create)
        .await?;
    let request = json_body(body)?;
    require_text("file_name", &request.file_name)?;
    require_text("storage_path", &request.storage_path)?;
    if request.size_bytes.is_some_and(|size| size < 0) {
        return Err(AppError::validation("size_bytes must not be negative"));
    }

    let order = visible_order(&state, &actor, &request.order_id).await?;

    let attachment = state
        .stores
        .attachments
        .insert(&NewAttachment {
            order_id: order.id,
            uploaded_by: actor.user_id.clone(),
            file_name: request.file_name.trim().to_string(),
            storage_path: request.storage_path,
            content_type: request.content_type,
            size_bytes: request.size_bytes,
        })
        .await?;

    events::record_activity(
        &state,
        &actor.user_id,
        "upload_attachment",
        "attachment",
        &attachment.id,
        Some(json!({ "order_id": attachment.order_id, "file_name": attachment.file_name })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<DeleteQuery>,
) -> AppResult<StatusCode> {
    let actor = user
        .authorize(&state, Resource::Attachments, Action::Delete)
        .await?;
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::validation("id query parameter is required"))?;

    let attachment = state
        .stores
        .attachments
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Attachment"))?;
    visible_order(&state, &actor, &attachment.order_id).await?;

    if !state.stores.attachments.delete(&attachment.id).await? {
        return Err(AppError::not_found("Attachment"));
    }

    events::record_activity(
        &state,
        &actor.user_id,
        "delete_attachment",
        "attachment",
        &attachment.id,
        Some(json!({ "storage_path": attachment.storage_path })),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

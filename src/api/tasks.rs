use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::api::{json_body, patch_object, require_text, typed_patch};
use crate::auth::roles::{Action, Resource, Scope};
use crate::auth::{Actor, AuthenticatedUser};
use crate::database::notification_repository::{NewNotification, NotificationKind};
use crate::database::task_repository::{
    NewTask, Task, TaskFilter, TaskPatch, TaskPriority, TaskStatus,
};
use crate::error::{AppError, AppResult};
use crate::events;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub order_id: Option<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub order_id: String,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Whether the task falls inside the actor's scope. Customers see tasks on
/// their own orders.
async fn ensure_visible(state: &AppState, actor: &Actor, task: &Task) -> AppResult<()> {
    let visible = match actor.scope {
        Scope::All => true,
        Scope::Assigned => actor.covers_assignee(task.assigned_to.as_deref()),
        Scope::Own => state
            .stores
            .orders
            .find_by_id(&task.order_id)
            .await?
            .is_some_and(|order| actor.covers_owner(&order.user_id)),
    };

    if visible {
        Ok(())
    } else {
        Err(AppError::forbidden("task is outside your scope"))
    }
}

fn assignment_notice(task: &Task, assignee: &str) -> NewNotification {
    NewNotification::new(
        assignee,
        NotificationKind::Task,
        format!("You have been assigned a task: {}", task.title),
    )
    .for_task(&task.id)
    .for_order(&task.order_id)
}

pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<TaskQuery>,
) -> AppResult<Json<Vec<Task>>> {
    let actor = user.authorize(&state, Resource::Tasks, Action::List).await?;

    let mut filter = TaskFilter {
        order_id: query.order_id,
        status: query.status.map(|s| s.as_str().to_string()),
        ..Default::default()
    };
    match actor.scope {
        Scope::All => {}
        Scope::Assigned => filter.assigned_to = Some(actor.user_id.clone()),
        Scope::Own => filter.order_owner = Some(actor.user_id.clone()),
    }

    Ok(Json(state.stores.tasks.list(&filter).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let actor = user.authorize(&state, Resource::Tasks, Action::Create).await?;
    let request = json_body(body)?;
    require_text("title", &request.title)?;

    if state.stores.orders.find_by_id(&request.order_id).await?.is_none() {
        return Err(AppError::not_found("Order"));
    }

    let task = state
        .stores
        .tasks
        .insert(&NewTask {
            order_id: request.order_id,
            title: request.title.trim().to_string(),
            description: request.description,
            assigned_to: request.assigned_to.filter(|a| !a.trim().is_empty()),
            priority: request.priority.unwrap_or(TaskPriority::Medium),
            due_date: request.due_date,
            created_by: actor.user_id.clone(),
        })
        .await?;

    events::record_activity(&state, &actor.user_id, "create_task", "task", &task.id, None).await;
    if let Some(assignee) = task.assigned_to.as_deref() {
        events::notify(&state, vec![assignment_notice(&task, assignee)]).await;
    }

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let actor = user.authorize(&state, Resource::Tasks, Action::Read).await?;
    let task = state
        .stores
        .tasks
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;

    ensure_visible(&state, &actor, &task).await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Task>> {
    let actor = user.authorize(&state, Resource::Tasks, Action::Update).await?;
    let fields = patch_object(body)?;
    actor.check_fields(Resource::Tasks, &fields)?;

    let current = state
        .stores
        .tasks
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;
    ensure_visible(&state, &actor, &current).await?;

    let details = Value::Object(fields.clone());
    let patch: TaskPatch = typed_patch(fields)?;

    let task = state
        .stores
        .tasks
        .update(&id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;

    events::record_activity(&state, &actor.user_id, "update_task", "task", &task.id, Some(details))
        .await;

    if task.assigned_to != current.assigned_to {
        if let Some(assignee) = task.assigned_to.as_deref() {
            events::notify(&state, vec![assignment_notice(&task, assignee)]).await;
        }
    }

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let actor = user.authorize(&state, Resource::Tasks, Action::Delete).await?;

    if !state.stores.tasks.delete(&id).await? {
        return Err(AppError::not_found("Task"));
    }

    events::record_activity(&state, &actor.user_id, "delete_task", "task", &id, None).await;
    Ok(StatusCode::NO_CONTENT)
}

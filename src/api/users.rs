use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::api::{patch_object, typed_patch};
use crate::auth::roles::{Action, Resource, Role};
use crate::auth::AuthenticatedUser;
use crate::database::profile_repository::{ProfilePatch, UserProfile};
use crate::error::{AppError, AppResult};
use crate::events;
use crate::state::AppState;

/// The caller's identity as the dashboard sees it
#[derive(Debug, Serialize)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
    pub has_profile: bool,
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<UserProfile>>> {
    user.authorize(&state, Resource::Users, Action::List).await?;
    Ok(Json(state.stores.profiles.list().await?))
}

pub async fn current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<CurrentUser>> {
    let actor = user.authorize(&state, Resource::Users, Action::Read).await?;
    let profile = state.stores.profiles.find(&actor.user_id).await?;

    let (full_name, email, has_profile) = match profile {
        Some(profile) => (profile.full_name, profile.email.or(actor.email), true),
        None => (None, actor.email, false),
    };

    Ok(Json(CurrentUser {
        user_id: actor.user_id,
        email,
        full_name,
        role: actor.role,
        has_profile,
    }))
}

pub async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<UserProfile>> {
    let actor = user.authorize(&state, Resource::Users, Action::Update).await?;
    let fields = patch_object(body)?;
    actor.check_fields(Resource::Users, &fields)?;

    let details = Value::Object(fields.clone());
    let patch: ProfilePatch = typed_patch(fields)?;

    if id == actor.user_id && patch.role.is_some_and(|role| role != Role::Admin) {
        return Err(AppError::validation("admins cannot demote themselves"));
    }

    let profile = state
        .stores
        .profiles
        .update(&id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    events::record_activity(&state, &actor.user_id, "update_user", "user", &id, Some(details)).await;
    Ok(Json(profile))
}

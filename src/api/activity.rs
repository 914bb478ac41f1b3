use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::auth::roles::{Action, Resource};
use crate::auth::AuthenticatedUser;
use crate::database::activity_repository::ActivityLog;
use crate::error::AppResult;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

pub async fn list_activity(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityLog>>> {
    user.authorize(&state, Resource::ActivityLogs, Action::List)
        .await?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Ok(Json(state.stores.activity.recent(limit).await?))
}

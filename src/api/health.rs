use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::database::{self, PoolStats};
use crate::state::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
    pub invoicing_sync: bool,
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION").to_string();

    let (database, pool) = match &state.pool {
        Some(pool) => match database::health_check(pool).await {
            Ok(()) => ("up", Some(database::get_pool_stats(pool))),
            Err(_) => ("down", None),
        },
        None => ("not_configured", None),
    };

    let healthy = database != "down";
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version,
        environment: state.environment.clone(),
        database: database.to_string(),
        pool,
        invoicing_sync: state.invoicing.is_enabled(),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

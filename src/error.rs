//! Application error type shared by handlers and services.
//!
//! Errors are coarse on purpose: each kind maps to one HTTP status and the
//! client only ever sees `{"error": "<message>"}`.

use crate::database::error::DatabaseError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

/// Failures reported by third-party services
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("{provider} error: {message}")]
    PaymentProvider { provider: String, message: String },

    #[error("{service} error: {message}")]
    Invoicing { service: String, message: String },
}

/// Failures of our own infrastructure
#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Error)]
pub enum AppErrorKind {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    External(ExternalError),

    #[error(transparent)]
    Infrastructure(InfrastructureError),
}

#[derive(Debug, Error)]
#[error("{kind}")]
pub struct AppError {
    pub kind: AppErrorKind,
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self { kind }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Unauthenticated(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Forbidden(message.into()))
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::new(AppErrorKind::NotFound(entity.into()))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Validation(message.into()))
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Infrastructure(
            InfrastructureError::Configuration {
                message: message.into(),
            },
        ))
    }

    pub fn payment_provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::External(ExternalError::PaymentProvider {
            provider: provider.into(),
            message: message.into(),
        }))
    }

    pub fn invoicing(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::External(ExternalError::Invoicing {
            service: service.into(),
            message: message.into(),
        }))
    }

    pub fn status_code(&self) -> StatusCode {
        match &self.kind {
            AppErrorKind::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppErrorKind::Forbidden(_) => StatusCode::FORBIDDEN,
            AppErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            AppErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
            AppErrorKind::External(_) => StatusCode::BAD_GATEWAY,
            AppErrorKind::Infrastructure(InfrastructureError::Database(db))
                if db.is_not_found() =>
            {
                StatusCode::NOT_FOUND
            }
            AppErrorKind::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DatabaseError> for AppError {
    fn from(error: DatabaseError) -> Self {
        Self::new(AppErrorKind::Infrastructure(InfrastructureError::Database(
            error,
        )))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from_sqlx(error).into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

//! RPC error surface.
//!
//! Every handler failure maps onto one of four kinds, serialized as
//! `{"code": "...", "error": "..."}` with a matching HTTP status. Runner
//! errors reach the caller only after the audit row is written; store
//! failures during audit writes are logged and swallowed upstream so they
//! never mask the execution result.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed cron, unknown job type, or an unsupported operation for
    /// the active provider.
    InvalidArgument(String),
    /// Delete against an absent name.
    NotFound(String),
    /// Backend API failure, container spawn failure (message carries the
    /// captured output), or store I/O failure.
    Internal(String),
    /// A required subsystem is not available in the current configuration.
    Unavailable(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL",
            ApiError::Unavailable(_) => "UNAVAILABLE",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::InvalidArgument(m)
            | ApiError::NotFound(m)
            | ApiError::Internal(m)
            | ApiError::Unavailable(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": self.code(),
            "error": self.message(),
        }));
        (self.status(), body).into_response()
    }
}

impl From<apollo_scheduler::SchedulerError> for ApiError {
    fn from(e: apollo_scheduler::SchedulerError) -> Self {
        ApiError::InvalidArgument(e.to_string())
    }
}

impl From<apollo_runner::RunnerError> for ApiError {
    fn from(e: apollo_runner::RunnerError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<apollo_store::StoreError> for ApiError {
    fn from(e: apollo_store::StoreError) -> Self {
        match e {
            apollo_store::StoreError::NotFound { name } => {
                ApiError::NotFound(format!("job not found: {name}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

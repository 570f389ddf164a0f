use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use common::WorkerKind;

/// Everything that can stop the coordinator from answering a request.
///
/// Failures of a single mapper or reducer call are not in here: the
/// dispatchers drop those on the spot.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Malformed request body.
    #[error("{0}")]
    Validation(String),

    #[error("Need at least {required} mappers, but only {actual} registered")]
    InsufficientMappers { required: usize, actual: usize },

    #[error("Need at least {required} reducers, but only {actual} registered")]
    InsufficientReducers { required: usize, actual: usize },

    /// Every mapper call of the job failed.
    #[error("No mapper returned results ({attempted} attempted)")]
    AllMappersFailed { attempted: usize },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoordinatorError {
    pub fn insufficient(kind: WorkerKind, required: usize, actual: usize) -> Self {
        match kind {
            WorkerKind::Mapper => CoordinatorError::InsufficientMappers { required, actual },
            WorkerKind::Reducer => CoordinatorError::InsufficientReducers { required, actual },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CoordinatorError::Validation(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::InsufficientMappers { .. }
            | CoordinatorError::InsufficientReducers { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CoordinatorError::AllMappersFailed { .. } | CoordinatorError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for CoordinatorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            CoordinatorError::Validation(message) => json!({ "error": message }),
            CoordinatorError::InsufficientMappers { .. } => json!({
                "error": "Insufficient mapper workers",
                "message": self.to_string(),
                "hint": "Start more mapper workers and register them with the coordinator",
            }),
            CoordinatorError::InsufficientReducers { .. } => json!({
                "error": "Insufficient reducer workers",
                "message": self.to_string(),
                "hint": "Start more reducer workers and register them with the coordinator",
            }),
            CoordinatorError::AllMappersFailed { .. } => json!({
                "error": "All mappers failed",
                "message": self.to_string(),
            }),
            CoordinatorError::Internal(e) => json!({ "error": format!("{:#}", e) }),
        };

        (status, Json(body)).into_response()
    }
}

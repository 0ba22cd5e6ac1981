//! Data transfer objects for web requests and responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::pipeline::{PipelineError, TaskId};

/// Response to a course submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Poll `/api/courses/{task_id}/status` with this
    pub task_id: TaskId,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    /// The task exists but has no course yet.
    Conflict { message: String },
    /// The task finished without a course.
    Unprocessable { message: String },
    Internal { message: String },
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        if e.is_request_error() {
            AppError::BadRequest {
                message: e.to_string(),
            }
        } else {
            AppError::Internal {
                message: e.to_string(),
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::Unprocessable { message } => (StatusCode::UNPROCESSABLE_ENTITY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(status = %status, error = %message, "request failed");
        } else {
            warn!(status = %status, error = %message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

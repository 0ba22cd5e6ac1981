//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::pipeline::{PlanRequest, TaskId, TaskState, TaskStatus};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/courses", post(submit_course))
        .route("/api/courses/:id/status", get(course_status))
        .route("/api/courses/:id", get(course_result))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Validate a course request and start planning it in the background.
async fn submit_course(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    // Parse JSON manually so we can log the body on failure
    let request: PlanRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(&body), "unparseable course request");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })?;

    let default_stops = state.pipeline.assembler().config().default_stop_count;
    request.clone().validate(default_stops)?;

    let pipeline = state.pipeline.clone();
    let handle = state
        .tasks
        .submit(async move { pipeline.run(request).await })
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            task_id: handle.id(),
        }),
    )
        .into_response())
}

async fn course_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskStatus>, AppError> {
    let id = parse_task_id(&id)?;
    state
        .tasks
        .status(&id)
        .await
        .map(Json)
        .ok_or_else(|| unknown_task(&id))
}

async fn course_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_task_id(&id)?;
    match state.tasks.state(&id).await {
        None => Err(unknown_task(&id)),
        Some(TaskState::Running) => Err(AppError::Conflict {
            message: format!("Task {id} is still running"),
        }),
        Some(TaskState::Failed(reason)) => Err(AppError::Unprocessable {
            message: reason,
        }),
        Some(TaskState::Succeeded(output)) => Ok(Json(output.as_ref()).into_response()),
    }
}

fn parse_task_id(text: &str) -> Result<TaskId, AppError> {
    text.parse().map_err(|_| AppError::BadRequest {
        message: format!("Invalid task id: {text}"),
    })
}

fn unknown_task(id: &TaskId) -> AppError {
    AppError::NotFound {
        message: format!("Task {id} not found or expired"),
    }
}

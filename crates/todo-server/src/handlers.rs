//! One handler per endpoint. Request payloads are declared structs with
//! optional fields; a field the client omits arrives as None and means
//! "not supplied". Malformed bodies are rejected by the Json extractor
//! before a handler runs.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info, warn};

use todo_service::{ImportRecord, ServiceError};

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct AddTaskRequest {
    pub name: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTaskRequest {
    pub id: Option<i64>,
}

/// GET /todo/all
pub async fn list_tasks(State(state): State<AppState>) -> Response {
    info!("fetching all tasks");
    match state.service.list_tasks() {
        Ok(tasks) => Json(tasks).into_response(),
        Err(err) => {
            error!(%err, "failed to fetch tasks");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /todo/add
pub async fn add_task(
    State(state): State<AppState>,
    Json(req): Json<AddTaskRequest>,
) -> Response {
    info!(name = ?req.name, completed = ?req.completed, "adding task");
    match state.service.add_task(req.name.as_deref(), req.completed) {
        Ok(task) => Json(task).into_response(),
        Err(err @ ServiceError::Validation(_)) => {
            warn!(%err, "rejected task add");
            StatusCode::BAD_REQUEST.into_response()
        }
        Err(err) => {
            error!(%err, "failed to add task");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /todo/update
///
/// "Not found" from the service becomes a 400, matching the add/update
/// error shape (empty body).
pub async fn update_task(
    State(state): State<AppState>,
    Json(req): Json<UpdateTaskRequest>,
) -> Response {
    info!(id = ?req.id, name = ?req.name, completed = ?req.completed, "updating task");
    match state.service.update_task(req.id, req.name.as_deref(), req.completed) {
        Ok(Some(task)) => Json(task).into_response(),
        Ok(None) => {
            warn!(id = ?req.id, "task not found");
            StatusCode::BAD_REQUEST.into_response()
        }
        Err(err @ ServiceError::Validation(_)) => {
            warn!(%err, "rejected task update");
            StatusCode::BAD_REQUEST.into_response()
        }
        Err(err) => {
            error!(%err, "failed to update task");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /todo/delete
pub async fn delete_task(
    State(state): State<AppState>,
    Json(req): Json<DeleteTaskRequest>,
) -> Response {
    info!(id = ?req.id, "deleting task");
    match state.service.delete_task(req.id) {
        Ok(true) => (StatusCode::OK, "Task deleted successfully").into_response(),
        Ok(false) => (StatusCode::BAD_REQUEST, "Failed to delete task").into_response(),
        Err(ServiceError::Validation(msg)) => {
            warn!(%msg, "rejected task delete");
            (StatusCode::BAD_REQUEST, msg).into_response()
        }
        Err(err) => {
            error!(%err, "failed to delete task");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while deleting the task",
            )
                .into_response()
        }
    }
}

/// POST /todo/import
pub async fn import_tasks(
    State(state): State<AppState>,
    Json(records): Json<Vec<ImportRecord>>,
) -> Response {
    info!(count = records.len(), "importing tasks");
    match state.service.import_tasks(&records) {
        Ok(count) => {
            info!(count, "import complete");
            (StatusCode::OK, "Tasks imported successfully").into_response()
        }
        Err(ServiceError::Validation(msg)) => {
            warn!(%msg, "rejected import");
            (StatusCode::BAD_REQUEST, msg).into_response()
        }
        Err(err) => {
            error!(%err, "failed to import tasks");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while importing tasks",
            )
                .into_response()
        }
    }
}

/// GET /todo/export — same content as /todo/all.
pub async fn export_tasks(State(state): State<AppState>) -> Response {
    info!("exporting all tasks");
    match state.service.list_tasks() {
        Ok(tasks) => Json(tasks).into_response(),
        Err(err) => {
            error!(%err, "failed to export tasks");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Owner-scoped task endpoints
///
/// # Endpoints
///
/// - `GET /tasks` - List own tasks, newest first
/// - `POST /tasks` - Create a task
/// - `GET /tasks/:id` - Get one own task
/// - `PUT /tasks/:id` - Partially update one own task
/// - `DELETE /tasks/:id` - Delete one own task
///
/// Every handler runs behind the bearer auth layer and receives the caller
/// as an [`AuthUser`] extension. A task that exists under another owner is
/// reported exactly like one that doesn't exist (404) — task ids never leak
/// across users.

use crate::{
    app::{AppState, AuthUser},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tasklist_shared::models::task::{CreateTask, Task, UpdateTask};
use tasklist_shared::models::user::User;
use uuid::Uuid;

/// Create request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateTaskRequest {
    /// Title, required non-empty
    pub title: String,

    /// Optional description, defaults to empty
    pub description: Option<String>,
}

/// Partial update request
///
/// Absent fields stay untouched; an entirely empty body is a no-op.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTaskRequest {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New completion flag
    pub completed: Option<bool>,
}

/// Single-task response
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    /// The task
    pub task: Task,
}

/// Task list response
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    /// All tasks owned by the caller, newest-created first
    pub tasks: Vec<Task>,
}

/// Deletion confirmation response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Confirmation message
    pub message: String,
}

/// Lists all tasks owned by the caller
///
/// Never errors on an empty result; a fresh user gets `{"tasks": []}`.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = Task::list_by_owner(&state.db, auth.id).await?;

    Ok(Json(TaskListResponse { tasks }))
}

/// Creates a task for the caller
///
/// On success a notification email is spawned off fire-and-forget: a
/// notifier failure is logged and never fails or rolls back the creation.
///
/// # Errors
///
/// - `400 Bad Request`: Missing or empty title
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    if req.title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            owner_id: auth.id,
            title: req.title,
            description: req.description.unwrap_or_default(),
        },
    )
    .await?;

    // The write is committed; everything from here on, the owner lookup
    // included, runs off the request path and can only be logged.
    let db = state.db.clone();
    let notifier = state.notifier.clone();
    let owner_id = auth.id;
    let title = task.title.clone();
    tokio::spawn(async move {
        let owner = match User::find_by_id(&db, owner_id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Owner lookup for task notification failed");
                return;
            }
        };

        if let Err(e) = notifier.task_created(&owner.email, &owner.name, &title).await {
            tracing::warn!(error = %e, "Task notification failed");
        }
    });

    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

/// Gets one task owned by the caller
///
/// # Errors
///
/// - `404 Not Found`: Unknown id, or a task owned by someone else
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_owner(&state.db, id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse { task }))
}

/// Partially updates one task owned by the caller
///
/// Applies only the fields present in the body; an empty body returns the
/// task unchanged. Concurrent updates are last-write-wins.
///
/// # Errors
///
/// - `400 Bad Request`: Title present but empty
/// - `404 Not Found`: Unknown id, or a task owned by someone else
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    if req.title.as_deref() == Some("") {
        return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
    }

    let task = Task::update_by_owner(
        &state.db,
        id,
        auth.id,
        UpdateTask {
            title: req.title,
            description: req.description,
            completed: req.completed,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse { task }))
}

/// Deletes one task owned by the caller
///
/// Deletion is permanent and not idempotent: a second delete of the same id
/// is a 404.
///
/// # Errors
///
/// - `404 Not Found`: Unknown id, or a task owned by someone else
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = Task::delete_by_owner(&state.db, id, auth.id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_absent_from_present() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert!(req.title.is_none());
        assert!(req.description.is_none());
        assert_eq!(req.completed, Some(true));
    }

    #[test]
    fn test_empty_update_request() {
        let req: UpdateTaskRequest = serde_json::from_str("{}").unwrap();
        assert!(req.title.is_none());
        assert!(req.description.is_none());
        assert!(req.completed.is_none());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title":"buy milk"}"#).unwrap();
        assert_eq!(req.title, "buy milk");
        assert!(req.description.is_none());
    }
}

/// Task endpoints
///
/// # Endpoints
///
/// - `POST   /v1/tasks` create a task on a board
/// - `GET    /v1/tasks/assigned-to-me` tasks assigned to the requester
/// - `GET    /v1/tasks/reviewing` tasks the requester reviews
/// - `GET    /v1/tasks/:task_id`
/// - `PATCH  /v1/tasks/:task_id` partial update; `null` clears a field
/// - `DELETE /v1/tasks/:task_id` creator or board owner only

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boardline_shared::auth::middleware::AuthContext;
use boardline_shared::models::task::{NewTask, Task, TaskPatch, TaskSummary};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Create task request
///
/// ```json
/// {
///   "board": "<board uuid>",
///   "title": "Fix bug",
///   "priority": "high",
///   "assignee_id": "<user uuid>",
///   "due_date": "2025-06-30"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub board: Uuid,

    #[serde(flatten)]
    pub task: NewTask,
}

pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state
        .services
        .tasks
        .create_task(req.board, auth.user_id, req.task)
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn assigned_to_me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.services.tasks.assigned_to(auth.user_id).await?;
    Ok(Json(tasks))
}

pub async fn reviewing(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.services.tasks.reviewing(auth.user_id).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskSummary>> {
    let task = state.services.tasks.get_task(task_id, auth.user_id).await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Json<Task>> {
    let task = state
        .services
        .tasks
        .update_task(task_id, auth.user_id, patch)
        .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.tasks.delete_task(task_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

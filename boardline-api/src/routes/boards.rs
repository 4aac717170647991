/// Board endpoints
///
/// # Endpoints
///
/// - `GET    /v1/boards` boards the requester belongs to
/// - `POST   /v1/boards` create a board, requester becomes owner
/// - `GET    /v1/boards/:board_id` board with members and tasks
/// - `PATCH  /v1/boards/:board_id` rename and/or replace members (also `PUT`)
/// - `DELETE /v1/boards/:board_id` owner only, removes tasks and comments
/// - `GET    /v1/boards/:board_id/tasks` tasks of a board

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boardline_shared::auth::middleware::AuthContext;
use boardline_shared::models::board::{BoardChanges, BoardDetail, BoardMembership, BoardSummary, NewBoard};
use boardline_shared::models::task::TaskSummary;
use uuid::Uuid;

pub async fn list_boards(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<BoardSummary>>> {
    let boards = state.services.boards.list_boards_for_user(auth.user_id).await?;
    Ok(Json(boards))
}

/// Create board
///
/// # Request Body
///
/// ```json
/// { "title": "Sprint 1", "members": ["<user uuid>", "..."] }
/// ```
///
/// # Response (201 Created)
///
/// The new board's summary.
pub async fn create_board(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<NewBoard>,
) -> ApiResult<(StatusCode, Json<BoardSummary>)> {
    let board = state.services.boards.create_board(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<BoardDetail>> {
    let board = state.services.boards.get_board_detail(board_id, auth.user_id).await?;
    Ok(Json(board))
}

/// Update board
///
/// Both fields are optional. An empty `members` list leaves membership as it is.
pub async fn update_board(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(board_id): Path<Uuid>,
    Json(req): Json<BoardChanges>,
) -> ApiResult<Json<BoardMembership>> {
    let board = state
        .services
        .boards
        .update_board(board_id, auth.user_id, req)
        .await?;
    Ok(Json(board))
}

pub async fn delete_board(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(board_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.boards.delete_board(board_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_board_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskSummary>>> {
    let tasks = state.services.tasks.list_board_tasks(board_id, auth.user_id).await?;
    Ok(Json(tasks))
}

/// Comment endpoints
///
/// # Endpoints
///
/// - `GET    /v1/tasks/:task_id/comments` oldest first
/// - `POST   /v1/tasks/:task_id/comments` `{ "content": "..." }`
/// - `DELETE /v1/tasks/:task_id/comments/:comment_id` author only

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boardline_shared::auth::middleware::AuthContext;
use boardline_shared::models::comment::{CommentView, NewComment};
use uuid::Uuid;

pub async fn list_comments(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let comments = state.services.comments.list_comments(task_id, auth.user_id).await?;
    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
    Json(req): Json<NewComment>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let comment = state
        .services
        .comments
        .add_comment(task_id, auth.user_id, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .services
        .comments
        .delete_comment(task_id, comment_id, auth.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

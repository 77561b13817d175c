/// Comment endpoints
///
/// - `POST /v1/tasks/:id/comments`: assignee, creator or collaborators of
///   the task only
/// - `DELETE /v1/comments/:id`: the comment's author only

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::tasks::find_task,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::{
        authorization::{require_comment, require_delete_comment},
        middleware::AuthContext,
    },
    models::{comment::Comment, task::Task},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(length(min = 1, max = 5000, message = "Comment must be between 1 and 5000 characters"))]
    pub content: String,
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(form): Json<CommentForm>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    form.validate()?;
    if form.content.trim().is_empty() {
        return Err(ApiError::invalid("content", "Comment must not be blank"));
    }

    let task = find_task(&state, task_id).await?;
    let collaborator_ids = Task::collaborator_ids(&state.db, task_id).await?;
    require_comment(&auth, &task, &collaborator_ids)?;

    let comment = Comment::create(&state.db, task_id, auth.user_id, &form.content).await?;

    tracing::info!(comment_id = %comment.id, task_id = %task_id, user_id = %auth.user_id, "Comment added");

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    require_delete_comment(&auth, &comment)?;

    Comment::delete(&state.db, id).await?;

    tracing::info!(comment_id = %id, user_id = %auth.user_id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// User endpoints
///
/// - `GET /v1/users`: every user, oldest account first
/// - `GET /v1/users/:id/tasks`: tasks assigned to a user, sortable and
///   filterable like the other task lists

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use taskboard_shared::{
    listing::{ListParams, Page, TaskListing},
    models::{
        task::Task,
        user::{User, UserSummary},
    },
};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct UserTasks {
    pub user: UserSummary,

    pub tasks: Page<Task>,
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

pub async fn list_user_tasks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<UserTasks>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let tasks = TaskListing::user_tasks(id, &params).fetch(&state.db).await?;

    Ok(Json(UserTasks {
        user: UserSummary::from(&user),
        tasks,
    }))
}

/// Task endpoints
///
/// # Endpoints
///
/// ```text
/// GET    /v1/tasks                 my tasks, 30 per page
/// POST   /v1/tasks                 create (creator = current user)
/// GET    /v1/tasks/search?q=...    free-text search, at most 20 hits
/// GET    /v1/tasks/:id             detail with comments and the assignee's other tasks
/// PUT    /v1/tasks/:id             replace editable fields
/// DELETE /v1/tasks/:id
/// POST   /v1/tasks/:id/mark-done   assignee or creator only
/// POST   /v1/tasks/:id/leave       drop yourself as assignee and collaborator
/// ```
///
/// List endpoints accept `sort`, `order`, `page` and the task filters
/// (`status`, `priority`, `project_id`, `assignee_id`, `creator_id`,
/// `due_from`, `due_to`, `q`). Unknown values are ignored.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        authorization::{can_comment, can_mark_done, require_leave, require_mark_done},
        middleware::AuthContext,
    },
    listing::{ListParams, Page, TaskListing},
    models::{
        comment::Comment,
        task::{CreateTask, Task, UpdateTask},
        user::{User, UserSummary},
        workflow::{Priority, Status},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Body of task create and update
#[derive(Debug, Deserialize, Validate)]
pub struct TaskForm {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub priority: Priority,

    pub due_date: DateTime<Utc>,

    pub assignee_id: Option<Uuid>,

    #[serde(default)]
    pub collaborator_ids: Vec<Uuid>,
}

impl TaskForm {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        if self.name.trim().is_empty() {
            return Err(ApiError::invalid("name", "Name must not be blank"));
        }
        Ok(())
    }

    fn description(&self) -> Option<String> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
    }
}

/// Task detail view
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    pub task: Task,

    pub overdue: bool,

    pub assignee: Option<UserSummary>,

    pub creator: Option<UserSummary>,

    pub collaborators: Vec<UserSummary>,

    pub project_ids: Vec<Uuid>,

    /// Other tasks of the same assignee, earliest deadline first
    pub assignee_other_tasks: Vec<Task>,

    /// Oldest first
    pub comments: Vec<Comment>,

    pub can_mark_done: bool,

    pub can_comment: bool,
}

pub async fn list_my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Task>>> {
    let page = TaskListing::my_tasks(auth.user_id, &params).fetch(&state.db).await?;
    Ok(Json(page))
}

pub async fn search_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Task>>> {
    let page = TaskListing::search(&params).fetch(&state.db).await?;
    Ok(Json(page))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(form): Json<TaskForm>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    form.check()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            description: form.description(),
            name: form.name,
            status: form.status,
            priority: form.priority,
            due_date: form.due_date,
            creator_id: Some(auth.user_id),
            assignee_id: form.assignee_id,
            collaborator_ids: form.collaborator_ids,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, user_id = %auth.user_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDetail>> {
    let task = find_task(&state, id).await?;

    let collaborator_ids = Task::collaborator_ids(&state.db, id).await?;
    let project_ids = Task::project_ids(&state.db, id).await?;
    let assignee_other_tasks = Task::other_tasks_of_assignee(&state.db, &task).await?;
    let comments = Comment::list_for_task(&state.db, id).await?;

    let mut people_ids = collaborator_ids.clone();
    people_ids.extend(task.assignee_id);
    people_ids.extend(task.creator_id);
    let people = User::find_summaries(&state.db, &people_ids).await?;
    let person = |id: Option<Uuid>| id.and_then(|id| people.iter().find(|p| p.id == id).cloned());

    let mut collaborators: Vec<UserSummary> = collaborator_ids
        .iter()
        .filter_map(|id| person(Some(*id)))
        .collect();
    collaborators.sort_by_key(|p| p.display_name());

    Ok(Json(TaskDetail {
        overdue: task.is_overdue(Utc::now()),
        assignee: person(task.assignee_id),
        creator: person(task.creator_id),
        can_mark_done: can_mark_done(auth.user_id, &task),
        can_comment: can_comment(auth.user_id, &task, &collaborator_ids),
        collaborators,
        project_ids,
        assignee_other_tasks,
        comments,
        task,
    }))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(form): Json<TaskForm>,
) -> ApiResult<Json<Task>> {
    form.check()?;

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            description: form.description(),
            name: form.name,
            status: form.status,
            priority: form.priority,
            due_date: form.due_date,
            assignee_id: form.assignee_id,
            collaborator_ids: form.collaborator_ids,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Task"))?;

    tracing::info!(task_id = %id, user_id = %auth.user_id, "Task updated");

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Task::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Task"));
    }

    tracing::info!(task_id = %id, user_id = %auth.user_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_done(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = find_task(&state, id).await?;
    require_mark_done(&auth, &task)?;

    let task = Task::mark_done(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    tracing::info!(task_id = %id, user_id = %auth.user_id, "Task marked as done");

    Ok(Json(task))
}

pub async fn leave_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = find_task(&state, id).await?;
    require_leave(&auth, &task)?;

    let task = Task::leave(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    tracing::info!(task_id = %id, user_id = %auth.user_id, "User left task");

    Ok(Json(task))
}

pub(crate) async fn find_task(state: &AppState, id: Uuid) -> ApiResult<Task> {
    Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))
}

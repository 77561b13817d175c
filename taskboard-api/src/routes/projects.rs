/// Project endpoints
///
/// # Endpoints
///
/// ```text
/// GET    /v1/projects                        all projects (filter: status, priority, creator_id, q)
/// POST   /v1/projects                        create (creator = current user)
/// GET    /v1/projects/:id                    detail with the sortable task listing
/// PUT    /v1/projects/:id                    replace editable fields
/// DELETE /v1/projects/:id
/// POST   /v1/projects/:id/tasks              link tasks      {"task_ids": [...]}
/// PUT    /v1/projects/:id/tasks              replace links   {"task_ids": [...]}
/// DELETE /v1/projects/:id/tasks              unlink all
/// DELETE /v1/projects/:id/tasks/:task_id     unlink one
/// GET    /v1/projects/:id/report             aggregates as JSON
/// GET    /v1/projects/:id/report/export      xlsx download
/// ```
///
/// Every link mutation answers with the project, whose `task_count` is
/// already recomputed.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskboard_shared::{
    auth::middleware::AuthContext,
    listing::{ListParams, Page, ProjectListing, TaskListing},
    models::{
        project::{CreateProject, Project, UpdateProject},
        task::Task,
        user::{User, UserSummary},
        workflow::{Priority, Status},
    },
    report::{aggregate, report_filename, ProjectReport, ReportWorkbook, XLSX_CONTENT_TYPE},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectForm {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: String,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub task_ids: Vec<Uuid>,

    #[serde(default)]
    pub collaborator_ids: Vec<Uuid>,
}

/// Absent `task_ids` / `collaborator_ids` leave the current sets alone
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectForm {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: String,

    pub status: Status,

    pub priority: Priority,

    pub task_ids: Option<Vec<Uuid>>,

    pub collaborator_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct TaskIds {
    pub task_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    pub project: Project,

    pub creator: Option<UserSummary>,

    pub collaborators: Vec<UserSummary>,

    /// Linked tasks, filtered and sorted per the query string
    pub tasks: Page<Task>,
}

#[derive(Debug, Serialize)]
pub struct ProjectReportResponse {
    pub project: Project,

    pub report: ProjectReport,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Project>>> {
    let page = ProjectListing::new(&params).fetch(&state.db).await?;
    Ok(Json(page))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(form): Json<CreateProjectForm>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    form.validate()?;
    check_name(&form.name)?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: form.name,
            description: form.description.trim().to_string(),
            status: form.status,
            priority: form.priority,
            creator_id: Some(auth.user_id),
            task_ids: form.task_ids,
            collaborator_ids: form.collaborator_ids,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, user_id = %auth.user_id, tasks = project.task_count, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ProjectDetail>> {
    let project = find_project(&state, id).await?;

    let tasks = TaskListing::project_tasks(id, &params).fetch(&state.db).await?;

    let collaborator_ids = Project::collaborator_ids(&state.db, id).await?;
    let mut people_ids = collaborator_ids.clone();
    people_ids.extend(project.creator_id);
    let people = User::find_summaries(&state.db, &people_ids).await?;

    let creator = project
        .creator_id
        .and_then(|creator_id| people.iter().find(|p| p.id == creator_id).cloned());

    let mut collaborators: Vec<UserSummary> = people
        .into_iter()
        .filter(|p| collaborator_ids.contains(&p.id))
        .collect();
    collaborators.sort_by_key(|p| p.display_name());

    Ok(Json(ProjectDetail {
        project,
        creator,
        collaborators,
        tasks,
    }))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(form): Json<UpdateProjectForm>,
) -> ApiResult<Json<Project>> {
    form.validate()?;
    check_name(&form.name)?;

    let project = Project::update(
        &state.db,
        id,
        UpdateProject {
            name: form.name,
            description: form.description.trim().to_string(),
            status: form.status,
            priority: form.priority,
            task_ids: form.task_ids,
            collaborator_ids: form.collaborator_ids,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Project"))?;

    tracing::info!(project_id = %id, user_id = %auth.user_id, "Project updated");

    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Project::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Project"));
    }

    tracing::info!(project_id = %id, user_id = %auth.user_id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_tasks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TaskIds>,
) -> ApiResult<Json<Project>> {
    let project = Project::add_tasks(&state.db, id, &body.task_ids)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    Ok(Json(project))
}

pub async fn set_tasks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TaskIds>,
) -> ApiResult<Json<Project>> {
    let project = Project::set_tasks(&state.db, id, &body.task_ids)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    Ok(Json(project))
}

pub async fn clear_tasks(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Project>> {
    let project = Project::clear_tasks(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    Ok(Json(project))
}

pub async fn remove_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Project>> {
    let project = Project::remove_task(&state.db, id, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    Ok(Json(project))
}

pub async fn project_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectReportResponse>> {
    let project = find_project(&state, id).await?;
    let tasks = Task::list_by_project(&state.db, id).await?;

    Ok(Json(ProjectReportResponse {
        report: aggregate(&tasks, Utc::now()),
        project,
    }))
}

pub async fn export_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let project = find_project(&state, id).await?;
    let tasks = Task::list_by_project(&state.db, id).await?;

    let people_ids: Vec<Uuid> = tasks
        .iter()
        .flat_map(|t| [t.assignee_id, t.creator_id])
        .flatten()
        .collect();
    let people: HashMap<Uuid, UserSummary> = User::find_summaries(&state.db, &people_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let now = Utc::now();
    let workbook = ReportWorkbook::build(&project, &tasks, &people, now);

    let bytes = tokio::task::spawn_blocking(move || workbook.to_xlsx())
        .await
        .map_err(|e| ApiError::InternalError(format!("Report task failed: {}", e)))??;

    let disposition = format!("attachment; filename=\"{}\"", report_filename(&project.name, now));

    tracing::info!(project_id = %id, user_id = %auth.user_id, bytes = bytes.len(), "Report exported");

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

async fn find_project(state: &AppState, id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))
}

fn check_name(name: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::invalid("name", "Name must not be blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_form_defaults() {
        let form: CreateProjectForm = serde_json::from_value(serde_json::json!({ "name": "Launch" })).unwrap();

        assert_eq!(form.description, "");
        assert_eq!(form.status, Status::Backlog);
        assert_eq!(form.priority, Priority::Low);
        assert!(form.task_ids.is_empty());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_update_form_keeps_absent_sets() {
        let form: UpdateProjectForm = serde_json::from_value(serde_json::json!({
            "name": "Launch",
            "status": "Done",
            "priority": "High",
            "task_ids": [],
        }))
        .unwrap();

        assert_eq!(form.task_ids, Some(Vec::new()));
        assert_eq!(form.collaborator_ids, None);
    }

    #[test]
    fn test_name_fits_column_width() {
        let create = |name: String| -> CreateProjectForm {
            serde_json::from_value(serde_json::json!({ "name": name })).unwrap()
        };
        assert!(create("p".repeat(100)).validate().is_ok());

        let errors = create("p".repeat(101)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let update: UpdateProjectForm = serde_json::from_value(serde_json::json!({
            "name": "p".repeat(101),
            "status": "Done",
            "priority": "High",
        }))
        .unwrap();
        assert!(update.validate().unwrap_err().field_errors().contains_key("name"));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(check_name("  ").is_err());
        assert!(check_name("Launch").is_ok());
    }
}

/// Project model, task links and the derived task counter
///
/// `projects.task_count` mirrors the number of rows in `project_tasks` for the
/// project. It is never written directly: every mutation of the link table
/// calls [`Project::update_task_count`] inside the same transaction, after
/// locking the project row, so concurrent link edits cannot leave a stale
/// count behind.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status VARCHAR(100) NOT NULL DEFAULT 'Backlog',
///     priority VARCHAR(100) NOT NULL DEFAULT 'Low',
///     task_count INTEGER NOT NULL DEFAULT 0 CHECK (task_count >= 0),
///     creator_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_tasks (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     PRIMARY KEY (project_id, task_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::project::{Project, CreateProject};
/// use taskboard_shared::models::workflow::{Priority, Status};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(task_ids: Vec<Uuid>) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     name: "Launch".to_string(),
///     description: String::new(),
///     status: Status::ToDo,
///     priority: Priority::High,
///     creator_id: None,
///     task_ids: task_ids.clone(),
///     collaborator_ids: vec![],
/// }).await?;
///
/// assert_eq!(project.task_count as usize, task_ids.len());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::workflow::{Priority, Status};
use crate::listing::ranking::Ranked;

pub(crate) const PROJECT_COLUMNS: &str = "id, name, description, status, priority, task_count, \
                                          creator_id, created_at";

/// [`PROJECT_COLUMNS`] qualified with the `p` alias used by list queries
pub(crate) const PROJECT_COLUMNS_P: &str = "p.id, p.name, p.description, p.status, p.priority, \
                                            p.task_count, p.creator_id, p.created_at";

/// Project row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    pub name: String,

    pub description: String,

    /// Status label as stored (see [`Status`])
    pub status: String,

    /// Priority label as stored (see [`Priority`])
    pub priority: String,

    /// Number of linked tasks
    pub task_count: i32,

    /// User who created the project (None if deleted)
    pub creator_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

impl Ranked for Project {
    fn status_label(&self) -> &str {
        &self.status
    }

    fn priority_label(&self) -> &str {
        &self.priority
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub priority: Priority,

    /// Set from the session, never from client input
    #[serde(skip)]
    pub creator_id: Option<Uuid>,

    /// Tasks to link; unknown IDs are skipped
    #[serde(default)]
    pub task_ids: Vec<Uuid>,

    /// Collaborators; unknown IDs are skipped
    #[serde(default)]
    pub collaborator_ids: Vec<Uuid>,
}

/// Replacement of a project's editable fields
///
/// `task_ids` and `collaborator_ids` replace the current sets when present
/// and leave them alone when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub status: Status,

    pub priority: Priority,

    pub task_ids: Option<Vec<Uuid>>,

    pub collaborator_ids: Option<Vec<Uuid>>,
}

impl Project {
    /// Creates a project with its task links and collaborators
    ///
    /// The returned project already carries the recomputed `task_count`.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, description, status, priority, creator_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(data.name.trim())
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.priority.as_str())
        .bind(data.creator_id)
        .fetch_one(&mut *tx)
        .await?;

        link_tasks(&mut tx, project.id, &data.task_ids).await?;
        replace_collaborators(&mut tx, project.id, &data.collaborator_ids).await?;

        let project = Self::update_task_count(&mut tx, project.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        tx.commit().await?;

        debug!(project_id = %project.id, task_count = project.task_count, "Project created");
        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Updates a project, optionally replacing its task and collaborator sets
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateProject) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE projects
            SET name = $2, description = $3, status = $4, priority = $5
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.priority.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(task_ids) = &data.task_ids {
            unlink_all(&mut tx, id).await?;
            link_tasks(&mut tx, id, task_ids).await?;
        }

        if let Some(collaborator_ids) = &data.collaborator_ids {
            replace_collaborators(&mut tx, id, collaborator_ids).await?;
        }

        let project = Self::update_task_count(&mut tx, id).await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Deletes a project
    ///
    /// Linked tasks survive; only the links are removed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Links tasks to the project; already linked or unknown tasks are skipped
    pub async fn add_tasks(pool: &PgPool, id: Uuid, task_ids: &[Uuid]) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !lock(&mut tx, id).await? {
            return Ok(None);
        }

        link_tasks(&mut tx, id, task_ids).await?;
        let project = Self::update_task_count(&mut tx, id).await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Unlinks one task from the project
    pub async fn remove_task(pool: &PgPool, id: Uuid, task_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !lock(&mut tx, id).await? {
            return Ok(None);
        }

        sqlx::query("DELETE FROM project_tasks WHERE project_id = $1 AND task_id = $2")
            .bind(id)
            .bind(task_id)
            .execute(&mut *tx)
            .await?;

        let project = Self::update_task_count(&mut tx, id).await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Replaces the project's task set
    pub async fn set_tasks(pool: &PgPool, id: Uuid, task_ids: &[Uuid]) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !lock(&mut tx, id).await? {
            return Ok(None);
        }

        unlink_all(&mut tx, id).await?;
        link_tasks(&mut tx, id, task_ids).await?;
        let project = Self::update_task_count(&mut tx, id).await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Unlinks every task from the project
    pub async fn clear_tasks(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !lock(&mut tx, id).await? {
            return Ok(None);
        }

        unlink_all(&mut tx, id).await?;
        let project = Self::update_task_count(&mut tx, id).await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Recomputes and stores `task_count` from `project_tasks`
    ///
    /// Must run on the connection (transaction) that mutated the links.
    /// Returns the refreshed project, or `None` if it does not exist.
    pub async fn update_task_count(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET task_count = (SELECT COUNT(*) FROM project_tasks WHERE project_id = $1)
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(project) = &project {
            debug!(project_id = %id, task_count = project.task_count, "Task count updated");
        }

        Ok(project)
    }

    /// IDs of the linked tasks
    pub async fn task_ids(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids = sqlx::query_scalar(
            "SELECT task_id FROM project_tasks WHERE project_id = $1 ORDER BY task_id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// IDs of the project's collaborators
    pub async fn collaborator_ids(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids = sqlx::query_scalar(
            "SELECT user_id FROM project_collaborators WHERE project_id = $1 ORDER BY user_id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }
}

/// Locks the project row for the rest of the transaction
async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}

async fn link_tasks(conn: &mut PgConnection, project_id: Uuid, task_ids: &[Uuid]) -> Result<(), sqlx::Error> {
    if task_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO project_tasks (project_id, task_id)
        SELECT $1, t.id FROM tasks t WHERE t.id = ANY($2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(task_ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn unlink_all(conn: &mut PgConnection, project_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM project_tasks WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn replace_collaborators(
    conn: &mut PgConnection,
    project_id: Uuid,
    user_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM project_collaborators WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *conn)
        .await?;

    if user_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO project_collaborators (project_id, user_id)
        SELECT $1, u.id FROM users u WHERE u.id = ANY($2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(user_ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Task model and database operations
///
/// A task has a deadline, a status and a priority, an optional creator and
/// assignee, a set of collaborators and can be linked to any number of
/// projects. Linking goes through `project_tasks`; every path here that
/// removes such a link recomputes [`Project::task_count`] in the same
/// transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     description TEXT,
///     status VARCHAR(100) NOT NULL DEFAULT 'Backlog',
///     priority VARCHAR(100) NOT NULL DEFAULT 'Low',
///     due_date TIMESTAMPTZ,
///     creator_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_collaborators (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use chrono::{Duration, Utc};
/// use taskboard_shared::models::task::{Task, CreateTask};
/// use taskboard_shared::models::workflow::{Priority, Status};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let me = Uuid::new_v4();
///
/// let task = Task::create(&pool, CreateTask {
///     name: "Write quarterly report".to_string(),
///     description: None,
///     status: Status::ToDo,
///     priority: Priority::High,
///     due_date: Utc::now() + Duration::days(7),
///     creator_id: Some(me),
///     assignee_id: Some(me),
///     collaborator_ids: vec![],
/// }).await?;
///
/// Task::mark_done(&pool, task.id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::project::Project;
use super::workflow::{Priority, Status};
use crate::listing::ranking::Ranked;

pub(crate) const TASK_COLUMNS: &str = "id, name, description, status, priority, due_date, \
                                       creator_id, assignee_id, created_at";

/// [`TASK_COLUMNS`] qualified with the `t` alias used by list queries
pub(crate) const TASK_COLUMNS_T: &str = "t.id, t.name, t.description, t.status, t.priority, \
                                         t.due_date, t.creator_id, t.assignee_id, t.created_at";

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    pub name: String,

    pub description: Option<String>,

    /// Status label as stored (see [`Status`])
    pub status: String,

    /// Priority label as stored (see [`Priority`])
    pub priority: String,

    /// Deadline; only legacy rows lack one
    pub due_date: Option<DateTime<Utc>>,

    /// User who created the task (None if deleted)
    pub creator_id: Option<Uuid>,

    /// User responsible for the task
    pub assignee_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

impl Ranked for Task {
    fn status_label(&self) -> &str {
        &self.status
    }

    fn priority_label(&self) -> &str {
        &self.priority
    }
}

impl Task {
    pub fn is_done(&self) -> bool {
        Status::parse(&self.status) == Some(Status::Done)
    }

    /// Past its deadline and not done
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_done() && self.due_date.is_some_and(|due| due < now)
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub priority: Priority,

    pub due_date: DateTime<Utc>,

    /// Set from the session, never from client input
    #[serde(skip)]
    pub creator_id: Option<Uuid>,

    pub assignee_id: Option<Uuid>,

    /// Unknown user IDs are skipped
    #[serde(default)]
    pub collaborator_ids: Vec<Uuid>,
}

/// Full replacement of a task's editable fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub name: String,

    pub description: Option<String>,

    pub status: Status,

    pub priority: Priority,

    pub due_date: DateTime<Utc>,

    pub assignee_id: Option<Uuid>,

    #[serde(default)]
    pub collaborator_ids: Vec<Uuid>,
}

impl Task {
    /// Creates a task together with its collaborator links
    ///
    /// # Errors
    ///
    /// Returns an error if the assignee does not exist or the database
    /// operation fails. Nothing is written in that case.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (name, description, status, priority, due_date, creator_id, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.name.trim())
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.priority.as_str())
        .bind(data.due_date)
        .bind(data.creator_id)
        .bind(data.assignee_id)
        .fetch_one(&mut *tx)
        .await?;

        replace_collaborators(&mut tx, task.id, &data.collaborator_ids).await?;

        tx.commit().await?;

        debug!(task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Replaces the editable fields and the collaborator set
    ///
    /// Returns `None` if the task does not exist.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateTask) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET name = $2,
                description = $3,
                status = $4,
                priority = $5,
                due_date = $6,
                assignee_id = $7
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.name.trim())
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.priority.as_str())
        .bind(data.due_date)
        .bind(data.assignee_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(task) = task else {
            return Ok(None);
        };

        replace_collaborators(&mut tx, task.id, &data.collaborator_ids).await?;

        tx.commit().await?;

        Ok(Some(task))
    }

    /// Deletes a task and recomputes the task count of every project it was
    /// linked to
    ///
    /// Comments and link rows go with the task (`ON DELETE CASCADE`).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT p.id FROM projects p
            JOIN project_tasks pt ON pt.project_id = p.id
            WHERE pt.task_id = $1
            ORDER BY p.id
            FOR UPDATE OF p
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        for project_id in &project_ids {
            Project::update_task_count(&mut tx, *project_id).await?;
        }

        tx.commit().await?;

        debug!(task_id = %id, projects = project_ids.len(), "Task deleted");
        Ok(true)
    }

    /// Sets the status to `Done`
    pub async fn mark_done(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET status = $2 WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(Status::Done.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Removes a user from a task
    ///
    /// Clears the assignee if it is `user_id` and drops `user_id` from the
    /// collaborators. Leaving a task the user has no part in changes nothing.
    pub async fn leave(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE tasks SET assignee_id = NULL WHERE id = $1 AND assignee_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM task_collaborators WHERE task_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(task)
    }

    /// IDs of the task's collaborators
    pub async fn collaborator_ids(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids = sqlx::query_scalar(
            "SELECT user_id FROM task_collaborators WHERE task_id = $1 ORDER BY user_id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// IDs of the projects the task is linked to
    pub async fn project_ids(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids = sqlx::query_scalar(
            "SELECT project_id FROM project_tasks WHERE task_id = $1 ORDER BY project_id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// The assignee's other tasks, earliest deadline first
    ///
    /// Empty when the task is unassigned.
    pub async fn other_tasks_of_assignee(pool: &PgPool, task: &Task) -> Result<Vec<Self>, sqlx::Error> {
        let Some(assignee_id) = task.assignee_id else {
            return Ok(Vec::new());
        };

        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE assignee_id = $1 AND id <> $2
            ORDER BY due_date ASC NULLS LAST, created_at ASC, id ASC
            "#
        ))
        .bind(assignee_id)
        .bind(task.id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// All tasks linked to a project, in stored order
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS_T} FROM tasks t
            JOIN project_tasks pt ON pt.task_id = t.id
            WHERE pt.project_id = $1
            ORDER BY t.created_at ASC, t.id ASC
            "#
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}

/// Replaces the collaborator set of a task, skipping unknown users
async fn replace_collaborators(
    conn: &mut PgConnection,
    task_id: Uuid,
    user_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM task_collaborators WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut *conn)
        .await?;

    if user_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO task_collaborators (task_id, user_id)
        SELECT $1, u.id FROM users u WHERE u.id = ANY($2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(task_id)
    .bind(user_ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

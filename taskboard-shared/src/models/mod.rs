/// Database models for Taskboard
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `workflow`: Status and priority enums shared by projects and tasks
/// - `user`: User accounts and authentication data
/// - `project`: Projects, task links and the derived task counter
/// - `task`: Tasks and task collaborators
/// - `comment`: Comments on tasks
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{User, CreateUser};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     first_name: "John".to_string(),
///     last_name: "Doe".to_string(),
///     is_staff: false,
///     is_superuser: false,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod comment;
pub mod project;
pub mod task;
pub mod user;
pub mod workflow;

/// Listing engine: filtering, sorting and pagination of tasks and projects
///
/// # Modules
///
/// - `filter`: raw query parameters and the typed filters parsed from them
/// - `sort`: per-collection sort allow-lists, sort plans and toggle links
/// - `ranking`: the custom status and priority orderings
/// - `query`: SQL construction and execution of listings
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::listing::{ListParams, TaskListing};
/// use uuid::Uuid;
///
/// # async fn example(pool: sqlx::PgPool, me: Uuid) -> Result<(), sqlx::Error> {
/// let params = ListParams {
///     sort: Some("priority".to_string()),
///     page: Some("2".to_string()),
///     ..Default::default()
/// };
///
/// let page = TaskListing::my_tasks(me, &params).fetch(&pool).await?;
/// println!("{} of {} tasks", page.items.len(), page.total_count);
/// # Ok(())
/// # }
/// ```

pub mod filter;
pub mod query;
pub mod ranking;
pub mod sort;

pub use filter::{ListParams, ProjectFilter, TaskFilter};
pub use query::{Page, ProjectListing, TaskListing};
pub use sort::{Collection, SortDirection, SortSpec};

/// Query engine for task and project collections
///
/// A listing is a base collection, a filter, an optional sort and a page
/// number. Execution follows the [`SortPlan`] of the sort:
///
/// ```text
/// Store(field, dir)        COUNT(*) + SELECT ... ORDER BY field dir, created_at, id
///                          LIMIT/OFFSET pushed down when the collection pages
///
/// Materialize(kind, dir)   SELECT ... ORDER BY created_at, id  (whole filtered set)
///                          stable rank sort in memory, then page/cap the result
/// ```
///
/// Without a sort the default stored order `created_at, id` is used.

use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::filter::{like_pattern, ListParams, ProjectFilter, TaskFilter};
use super::ranking::sort_by_rank;
use super::sort::{sort_links, Collection, SortLink, SortPlan, SortSpec};
use crate::models::project::{Project, PROJECT_COLUMNS_P};
use crate::models::task::{Task, TASK_COLUMNS_T};

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Size of the whole filtered set
    pub total_count: i64,

    /// Requested page (0 = out of range)
    pub page: u64,

    /// Fixed page size, or None for unpaginated collections
    pub page_size: Option<usize>,

    /// Active sort field and direction, if any
    pub sort: Option<String>,
    pub order: Option<String>,

    /// Next-click order of every sortable column
    pub sort_links: Vec<SortLink>,
}

impl<T> Page<T> {
    /// Converts the items, keeping paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            sort: self.sort,
            order: self.order,
            sort_links: self.sort_links,
        }
    }
}

/// Slice of the ordered set that a page request selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    All,
    Range { offset: usize, limit: usize },
    Empty,
}

impl Window {
    pub fn for_request(collection: Collection, page: u64) -> Self {
        if let Some(size) = collection.page_size() {
            if page == 0 {
                return Window::Empty;
            }
            let offset = usize::try_from(page - 1)
                .ok()
                .and_then(|p| p.checked_mul(size));
            return match offset {
                Some(offset) => Window::Range { offset, limit: size },
                None => Window::Empty,
            };
        }

        match collection.result_cap() {
            Some(cap) => Window::Range { offset: 0, limit: cap },
            None => Window::All,
        }
    }

    /// Applies the window to an already ordered set
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        match *self {
            Window::All => items,
            Window::Range { offset, limit } => items.into_iter().skip(offset).take(limit).collect(),
            Window::Empty => Vec::new(),
        }
    }
}

/// Base set of a task collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskBase {
    /// Tasks assigned to a user
    AssignedTo(Uuid),
    /// Tasks linked to a project
    InProject(Uuid),
    /// Every task
    All,
}

/// A fully resolved task listing request
#[derive(Debug, Clone)]
pub struct TaskListing {
    pub collection: Collection,
    pub base: TaskBase,
    pub filter: TaskFilter,
    pub sort: Option<SortSpec>,
    pub page: u64,
}

impl TaskListing {
    /// Tasks assigned to the current user, 30 per page
    pub fn my_tasks(user_id: Uuid, params: &ListParams) -> Self {
        Self::new(Collection::MyTasks, TaskBase::AssignedTo(user_id), params)
    }

    /// Tasks assigned to a given user
    pub fn user_tasks(user_id: Uuid, params: &ListParams) -> Self {
        Self::new(Collection::UserTasks, TaskBase::AssignedTo(user_id), params)
    }

    /// Tasks linked to a project
    pub fn project_tasks(project_id: Uuid, params: &ListParams) -> Self {
        Self::new(Collection::ProjectTasks, TaskBase::InProject(project_id), params)
    }

    /// Free-text search over all tasks, capped at 20 hits
    pub fn search(params: &ListParams) -> Self {
        Self::new(Collection::Search, TaskBase::All, params)
    }

    fn new(collection: Collection, base: TaskBase, params: &ListParams) -> Self {
        Self {
            collection,
            base,
            filter: TaskFilter::from_params(params),
            sort: SortSpec::parse(collection, params.sort.as_deref(), params.order.as_deref()),
            page: params.page(),
        }
    }

    /// Whether the listing cannot match anything without touching the store
    fn is_trivially_empty(&self) -> bool {
        self.collection == Collection::Search && self.filter.q.is_none()
    }

    /// `SELECT` for the filtered set, ordered and windowed per the plan
    pub fn select_query(&self) -> QueryBuilder<'static, Postgres> {
        let plan = self.sort.as_ref().map(SortSpec::plan);
        let join_assignee = matches!(plan, Some(SortPlan::Store(field, _)) if field.needs_assignee_join());

        let mut qb = QueryBuilder::new(format!("SELECT {TASK_COLUMNS_T} FROM tasks t"));
        if join_assignee {
            qb.push(" LEFT JOIN users a ON a.id = t.assignee_id");
        }
        self.push_conditions(&mut qb);

        match plan {
            Some(SortPlan::Store(field, direction)) => {
                qb.push(format_args!(
                    " ORDER BY {} {}, t.created_at ASC, t.id ASC",
                    field.column(),
                    direction.as_sql()
                ));
                push_window(&mut qb, Window::for_request(self.collection, self.page));
            }
            Some(SortPlan::Materialize(..)) => {
                qb.push(" ORDER BY t.created_at ASC, t.id ASC");
            }
            None => {
                qb.push(" ORDER BY t.created_at ASC, t.id ASC");
                push_window(&mut qb, Window::for_request(self.collection, self.page));
            }
        }

        qb
    }

    /// `SELECT COUNT(*)` for the filtered set
    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tasks t");
        self.push_conditions(&mut qb);
        qb
    }

    fn push_conditions(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" WHERE TRUE");

        match self.base {
            TaskBase::AssignedTo(user_id) => {
                qb.push(" AND t.assignee_id = ").push_bind(user_id);
            }
            TaskBase::InProject(project_id) => {
                push_in_project(qb, project_id);
            }
            TaskBase::All => {}
        }

        let filter = &self.filter;
        if let Some(status) = filter.status {
            qb.push(" AND t.status = ").push_bind(status.as_str());
        }
        if let Some(priority) = filter.priority {
            qb.push(" AND t.priority = ").push_bind(priority.as_str());
        }
        if let Some(project_id) = filter.project_id {
            push_in_project(qb, project_id);
        }
        if let Some(assignee_id) = filter.assignee_id {
            qb.push(" AND t.assignee_id = ").push_bind(assignee_id);
        }
        if let Some(creator_id) = filter.creator_id {
            qb.push(" AND t.creator_id = ").push_bind(creator_id);
        }
        if let Some(from) = filter.due_from {
            qb.push(" AND t.due_date >= ").push_bind(from);
        }
        if let Some(to) = filter.due_to {
            qb.push(" AND t.due_date <= ").push_bind(to);
        }
        if let Some(q) = &filter.q {
            let pattern = like_pattern(q);
            qb.push(" AND (t.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR t.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    /// Runs the listing
    pub async fn fetch(&self, pool: &PgPool) -> Result<Page<Task>, sqlx::Error> {
        if self.is_trivially_empty() {
            return Ok(self.page_of(Vec::new(), 0));
        }

        let total_count: i64 = self.count_query().build_query_scalar().fetch_one(pool).await?;
        let window = Window::for_request(self.collection, self.page);

        let items = match self.sort.as_ref().map(SortSpec::plan) {
            Some(SortPlan::Materialize(kind, direction)) => {
                let mut all: Vec<Task> = self.select_query().build_query_as().fetch_all(pool).await?;
                sort_by_rank(&mut all, kind, direction);
                window.apply(all)
            }
            _ if window == Window::Empty => Vec::new(),
            _ => self.select_query().build_query_as().fetch_all(pool).await?,
        };

        debug!(
            collection = ?self.collection,
            total_count,
            returned = items.len(),
            "Task listing fetched"
        );

        Ok(self.page_of(items, total_count))
    }

    fn page_of(&self, items: Vec<Task>, total_count: i64) -> Page<Task> {
        page_of(self.collection, self.sort.as_ref(), self.page, items, total_count)
    }
}

/// A fully resolved project listing request
#[derive(Debug, Clone)]
pub struct ProjectListing {
    pub filter: ProjectFilter,
    pub sort: Option<SortSpec>,
}

impl ProjectListing {
    pub fn new(params: &ListParams) -> Self {
        Self {
            filter: ProjectFilter::from_params(params),
            sort: SortSpec::parse(Collection::Projects, params.sort.as_deref(), params.order.as_deref()),
        }
    }

    pub fn select_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {PROJECT_COLUMNS_P} FROM projects p"));
        self.push_conditions(&mut qb);

        match self.sort.as_ref().map(SortSpec::plan) {
            Some(SortPlan::Store(field, direction)) => {
                qb.push(format_args!(
                    " ORDER BY {} {}, p.created_at ASC, p.id ASC",
                    field.column(),
                    direction.as_sql()
                ));
            }
            _ => {
                qb.push(" ORDER BY p.created_at ASC, p.id ASC");
            }
        }

        qb
    }

    fn push_conditions(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" WHERE TRUE");

        let filter = &self.filter;
        if let Some(status) = filter.status {
            qb.push(" AND p.status = ").push_bind(status.as_str());
        }
        if let Some(priority) = filter.priority {
            qb.push(" AND p.priority = ").push_bind(priority.as_str());
        }
        if let Some(creator_id) = filter.creator_id {
            qb.push(" AND p.creator_id = ").push_bind(creator_id);
        }
        if let Some(q) = &filter.q {
            let pattern = like_pattern(q);
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    /// Runs the listing; projects are never paginated
    pub async fn fetch(&self, pool: &PgPool) -> Result<Page<Project>, sqlx::Error> {
        let mut items: Vec<Project> = self.select_query().build_query_as().fetch_all(pool).await?;

        if let Some(SortPlan::Materialize(kind, direction)) = self.sort.as_ref().map(SortSpec::plan) {
            sort_by_rank(&mut items, kind, direction);
        }

        let total_count = items.len() as i64;
        Ok(page_of(Collection::Projects, self.sort.as_ref(), 1, items, total_count))
    }
}

fn page_of<T>(
    collection: Collection,
    sort: Option<&SortSpec>,
    page: u64,
    items: Vec<T>,
    total_count: i64,
) -> Page<T> {
    Page {
        items,
        total_count,
        page,
        page_size: collection.page_size(),
        sort: sort.map(|s| s.field.to_string()),
        order: sort.map(|s| s.direction.as_str().to_string()),
        sort_links: sort_links(collection, sort),
    }
}

fn push_in_project(qb: &mut QueryBuilder<'static, Postgres>, project_id: Uuid) {
    qb.push(" AND EXISTS (SELECT 1 FROM project_tasks pt WHERE pt.task_id = t.id AND pt.project_id = ")
        .push_bind(project_id)
        .push(")");
}

fn push_window(qb: &mut QueryBuilder<'static, Postgres>, window: Window) {
    match window {
        Window::All => {}
        Window::Range { offset, limit } => {
            qb.push(" LIMIT ")
                .push_bind(limit as i64)
                .push(" OFFSET ")
                .push_bind(offset as i64);
        }
        Window::Empty => {
            qb.push(" LIMIT 0");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "sort" => params.sort = value,
                "order" => params.order = value,
                "page" => params.page = value,
                "status" => params.status = value,
                "priority" => params.priority = value,
                "project_id" => params.project_id = value,
                "q" => params.q = value,
                "due_from" => params.due_from = value,
                other => panic!("unexpected param {other}"),
            }
        }
        params
    }

    #[test]
    fn test_window_for_paginated_collection() {
        assert_eq!(
            Window::for_request(Collection::MyTasks, 1),
            Window::Range { offset: 0, limit: 30 }
        );
        assert_eq!(
            Window::for_request(Collection::MyTasks, 3),
            Window::Range { offset: 60, limit: 30 }
        );
        assert_eq!(Window::for_request(Collection::MyTasks, 0), Window::Empty);
    }

    #[test]
    fn test_window_for_unpaginated_collections() {
        assert_eq!(Window::for_request(Collection::ProjectTasks, 7), Window::All);
        assert_eq!(Window::for_request(Collection::Projects, 0), Window::All);
        assert_eq!(
            Window::for_request(Collection::Search, 4),
            Window::Range { offset: 0, limit: 20 }
        );
    }

    #[test]
    fn test_window_apply() {
        let items: Vec<u32> = (1..=70).collect();
        let page = Window::for_request(Collection::MyTasks, 3).apply(items.clone());
        assert_eq!(page, (61..=70).collect::<Vec<_>>());

        let beyond = Window::for_request(Collection::MyTasks, 4).apply(items.clone());
        assert!(beyond.is_empty());

        assert!(Window::Empty.apply(items).is_empty());
    }

    #[test]
    fn test_default_order_without_sort() {
        let listing = TaskListing::my_tasks(Uuid::new_v4(), &params(&[]));
        let sql = listing.select_query().sql().to_string();

        assert!(sql.contains("t.assignee_id = $1"));
        assert!(sql.ends_with("ORDER BY t.created_at ASC, t.id ASC LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn test_unknown_sort_field_uses_default_order() {
        let listing = TaskListing::user_tasks(Uuid::new_v4(), &params(&[("sort", "bogus_field")]));
        assert!(listing.sort.is_none());

        let sql = listing.select_query().sql().to_string();
        assert!(sql.ends_with("ORDER BY t.created_at ASC, t.id ASC"));
    }

    #[test]
    fn test_natural_sort_is_pushed_down() {
        let listing = TaskListing::my_tasks(
            Uuid::new_v4(),
            &params(&[("sort", "due_date"), ("order", "desc"), ("page", "2")]),
        );
        let sql = listing.select_query().sql().to_string();

        assert!(sql.contains("ORDER BY t.due_date DESC, t.created_at ASC, t.id ASC"));
        assert!(sql.contains("LIMIT"));
    }

    #[test]
    fn test_rank_sort_materializes_whole_set() {
        let listing = TaskListing::my_tasks(Uuid::new_v4(), &params(&[("sort", "-priority")]));
        let sql = listing.select_query().sql().to_string();

        assert!(sql.ends_with("ORDER BY t.created_at ASC, t.id ASC"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn test_assignee_sort_joins_users() {
        let listing = TaskListing::project_tasks(Uuid::new_v4(), &params(&[("sort", "assignee")]));
        let sql = listing.select_query().sql().to_string();

        assert!(sql.contains("LEFT JOIN users a ON a.id = t.assignee_id"));
        assert!(sql.contains("EXISTS (SELECT 1 FROM project_tasks pt"));
        assert!(sql.contains("ORDER BY a.first_name ASC"));
    }

    #[test]
    fn test_filters_are_and_combined() {
        let listing = TaskListing::search(&params(&[
            ("q", "report"),
            ("status", "Done"),
            ("priority", "nonsense"),
            ("due_from", "2025-01-01"),
        ]));
        let count = listing.count_query().sql().to_string();

        assert!(count.starts_with("SELECT COUNT(*) FROM tasks t WHERE TRUE"));
        assert!(count.contains("AND t.status = $1"));
        assert!(!count.contains("t.priority"));
        assert!(count.contains("AND t.due_date >= $2"));
        assert!(count.contains("t.name ILIKE $3 OR t.description ILIKE $4"));
    }

    #[test]
    fn test_blank_search_is_trivially_empty() {
        assert!(TaskListing::search(&params(&[("q", "  ")])).is_trivially_empty());
        assert!(!TaskListing::search(&params(&[("q", "x")])).is_trivially_empty());
    }

    #[test]
    fn test_project_listing_sql() {
        let listing = ProjectListing::new(&params(&[("sort", "task_count"), ("order", "desc")]));
        let sql = listing.select_query().sql().to_string();
        assert!(sql.contains("ORDER BY p.task_count DESC, p.created_at ASC, p.id ASC"));

        let ranked = ProjectListing::new(&params(&[("sort", "status"), ("status", "To do")]));
        let sql = ranked.select_query().sql().to_string();
        assert!(sql.contains("AND p.status = $1"));
        assert!(sql.ends_with("ORDER BY p.created_at ASC, p.id ASC"));
    }

    #[test]
    fn test_page_metadata_carries_sort_links() {
        let listing = TaskListing::my_tasks(
            Uuid::new_v4(),
            &params(&[("sort", "task_name"), ("order", "asc")]),
        );
        let page = listing.page_of(Vec::new(), 0);

        assert_eq!(page.page_size, Some(30));
        assert_eq!(page.sort.as_deref(), Some("task_name"));
        assert_eq!(page.order.as_deref(), Some("asc"));
        let link = page.sort_links.iter().find(|l| l.field == "task_name").unwrap();
        assert_eq!(link.order.as_str(), "desc");
    }
}

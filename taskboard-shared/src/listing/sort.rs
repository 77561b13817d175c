/// Sort specifications, allow-lists and the toggle-sort contract
///
/// A list request names a field (`sort=due_date`) and a direction
/// (`order=desc`, or the legacy `sort=-due_date`). The field is checked against
/// the allow-list of the collection being listed and resolved to a
/// [`SortKey`]. Anything not on the allow-list resolves to `None`, which means
/// "default stored order"; it is never an error.
///
/// Resolved keys are split by [`SortSpec::plan`]:
///
/// - [`SortPlan::Store`]: natural ordering, pushed down to SQL `ORDER BY`
/// - [`SortPlan::Materialize`]: a rank ordering the database cannot express,
///   applied in memory after the whole filtered set is loaded
///
/// # Example
///
/// ```
/// use taskboard_shared::listing::sort::{Collection, SortPlan, SortSpec};
///
/// let spec = SortSpec::parse(Collection::ProjectTasks, Some("-priority"), None).unwrap();
/// assert!(matches!(spec.plan(), SortPlan::Materialize(..)));
///
/// assert!(SortSpec::parse(Collection::MyTasks, Some("bogus_field"), None).is_none());
/// ```

use serde::{Deserialize, Serialize};

use super::ranking::RankKind;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `"desc"` (any case) is descending, everything else ascending
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Fields with a natural (type-defined) ordering the database can sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalField {
    TaskName,
    DueDate,
    /// First name of the task assignee
    AssigneeName,
    ProjectName,
    TaskCount,
    CreatedAt,
}

impl NaturalField {
    /// SQL expression for `ORDER BY`
    ///
    /// Task queries alias `tasks` as `t` and the assignee join as `a`;
    /// project queries alias `projects` as `p`.
    pub fn column(&self) -> &'static str {
        match self {
            NaturalField::TaskName => "t.name",
            NaturalField::DueDate => "t.due_date",
            NaturalField::AssigneeName => "a.first_name",
            NaturalField::ProjectName => "p.name",
            NaturalField::TaskCount => "p.task_count",
            NaturalField::CreatedAt => "p.created_at",
        }
    }

    /// Whether the query needs the assignee join
    pub fn needs_assignee_join(&self) -> bool {
        matches!(self, NaturalField::AssigneeName)
    }
}

/// Tagged set of sortable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Natural(NaturalField),
    PriorityRank,
    StatusRank,
}

/// How a resolved sort is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPlan {
    /// Push `ORDER BY` down to the store
    Store(NaturalField, SortDirection),

    /// Load the filtered set, then rank-sort in memory
    Materialize(RankKind, SortDirection),
}

/// Collections the query engine can list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Tasks assigned to the current user
    MyTasks,
    /// Tasks linked to one project
    ProjectTasks,
    /// Tasks assigned to a given user
    UserTasks,
    /// Free-text task search
    Search,
    /// All projects
    Projects,
}

const TASK_FIELDS: &[&str] = &["task_name", "due_date", "priority", "status"];
const PROJECT_TASK_FIELDS: &[&str] = &["task_name", "due_date", "priority", "status", "assignee"];
const PROJECT_FIELDS: &[&str] = &["project_name", "status", "priority", "task_count", "created_at"];

/// Page size of the "my tasks" list
pub const MY_TASKS_PAGE_SIZE: usize = 30;

/// Maximum number of search hits returned
pub const SEARCH_RESULT_CAP: usize = 20;

impl Collection {
    /// Field names accepted in `sort=` for this collection
    pub fn sortable_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::MyTasks | Collection::UserTasks | Collection::Search => TASK_FIELDS,
            Collection::ProjectTasks => PROJECT_TASK_FIELDS,
            Collection::Projects => PROJECT_FIELDS,
        }
    }

    /// Fixed page size, if the collection is paginated
    pub fn page_size(&self) -> Option<usize> {
        match self {
            Collection::MyTasks => Some(MY_TASKS_PAGE_SIZE),
            _ => None,
        }
    }

    /// Upper bound on returned items for unpaginated collections
    pub fn result_cap(&self) -> Option<usize> {
        match self {
            Collection::Search => Some(SEARCH_RESULT_CAP),
            _ => None,
        }
    }

    /// Resolves an allow-listed field name to its sort key
    pub fn resolve(&self, field: &str) -> Option<SortKey> {
        if !self.sortable_fields().contains(&field) {
            return None;
        }

        let key = match field {
            "priority" => SortKey::PriorityRank,
            "status" => SortKey::StatusRank,
            "task_name" => SortKey::Natural(NaturalField::TaskName),
            "due_date" => SortKey::Natural(NaturalField::DueDate),
            "assignee" => SortKey::Natural(NaturalField::AssigneeName),
            "project_name" => SortKey::Natural(NaturalField::ProjectName),
            "task_count" => SortKey::Natural(NaturalField::TaskCount),
            "created_at" => SortKey::Natural(NaturalField::CreatedAt),
            _ => return None,
        };

        Some(key)
    }
}

/// A validated sort request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field name as accepted by the allow-list
    pub field: &'static str,
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Resolves raw `sort`/`order` query values
    ///
    /// A leading `-` on `sort` forces descending order regardless of `order`.
    /// Returns `None` for a missing or unknown field.
    pub fn parse(collection: Collection, sort: Option<&str>, order: Option<&str>) -> Option<Self> {
        let raw = sort.map(str::trim).filter(|s| !s.is_empty())?;

        let (name, direction) = match raw.strip_prefix('-') {
            Some(stripped) => (stripped, SortDirection::Desc),
            None => (raw, SortDirection::parse(order)),
        };

        let field = collection
            .sortable_fields()
            .iter()
            .copied()
            .find(|candidate| *candidate == name)?;
        let key = collection.resolve(field)?;

        Some(Self {
            field,
            key,
            direction,
        })
    }

    /// Execution plan for this sort
    pub fn plan(&self) -> SortPlan {
        match self.key {
            SortKey::Natural(field) => SortPlan::Store(field, self.direction),
            SortKey::PriorityRank => SortPlan::Materialize(RankKind::Priority, self.direction),
            SortKey::StatusRank => SortPlan::Materialize(RankKind::Status, self.direction),
        }
    }
}

/// Next-click state of one sortable column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortLink {
    pub field: &'static str,

    /// Whether this column is the active sort
    pub active: bool,

    /// `order` to put on this column's link
    pub order: SortDirection,
}

/// Order for a column's link: `desc` only when that column is already
/// sorted ascending, `asc` otherwise
pub fn next_order(current: Option<&SortSpec>, candidate: &str) -> SortDirection {
    match current {
        Some(spec) if spec.field == candidate && spec.direction == SortDirection::Asc => {
            SortDirection::Desc
        }
        _ => SortDirection::Asc,
    }
}

/// Toggle links for every sortable column of a collection
pub fn sort_links(collection: Collection, current: Option<&SortSpec>) -> Vec<SortLink> {
    collection
        .sortable_fields()
        .iter()
        .map(|&field| SortLink {
            field,
            active: current.is_some_and(|spec| spec.field == field),
            order: next_order(current, field),
        })
        .collect()
}

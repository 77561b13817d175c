/// Rank tables for the custom status and priority orderings
///
/// Status and priority do not sort by their labels. Ascending order puts the
/// most pressing value first:
///
/// ```text
/// priority  Urgent(1) < High(2) < Medium(3) < Low(4)
/// status    Done(1) < In progress(2) < To do(3) < Backlog(4)
/// ```
///
/// Descending order reverses the numeric key (Urgent = 4 .. Low = 1). A label
/// that maps to no variant ranks [`UNRANKED_ASC`] ascending, so it sorts last,
/// and [`UNRANKED_DESC`] descending, so it sorts first.
///
/// These tables are the only place the orderings are defined; the query engine
/// and the report aggregator both go through [`rank`].

use super::sort::SortDirection;
use crate::models::workflow::{Priority, Status};

/// Rank of an unmapped label in ascending order
pub const UNRANKED_ASC: u32 = 999;

/// Rank of an unmapped label in descending order
pub const UNRANKED_DESC: u32 = 0;

/// Ascending priority order, most urgent first
const PRIORITY_ORDER: [Priority; 4] = [
    Priority::Urgent,
    Priority::High,
    Priority::Medium,
    Priority::Low,
];

/// Ascending status order, finished work first
const STATUS_ORDER: [Status; 4] = [
    Status::Done,
    Status::InProgress,
    Status::ToDo,
    Status::Backlog,
];

/// Which custom ordering to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKind {
    Priority,
    Status,
}

impl RankKind {
    /// Field name used in sort query strings
    pub fn field(&self) -> &'static str {
        match self {
            RankKind::Priority => "priority",
            RankKind::Status => "status",
        }
    }
}

/// Anything carrying status and priority labels as stored
pub trait Ranked {
    fn status_label(&self) -> &str;
    fn priority_label(&self) -> &str;

    /// Label the given ordering looks at
    fn rank_label(&self, kind: RankKind) -> &str {
        match kind {
            RankKind::Priority => self.priority_label(),
            RankKind::Status => self.status_label(),
        }
    }
}

/// 1-based ascending position of a priority
pub fn priority_rank(priority: Priority) -> u32 {
    position(&PRIORITY_ORDER, &priority)
}

/// 1-based ascending position of a status
pub fn status_rank(status: Status) -> u32 {
    position(&STATUS_ORDER, &status)
}

/// Sort key for a stored label under the given ordering and direction
pub fn rank(kind: RankKind, label: &str, direction: SortDirection) -> u32 {
    let ascending = match kind {
        RankKind::Priority => Priority::parse(label).map(priority_rank),
        RankKind::Status => Status::parse(label).map(status_rank),
    };

    match (ascending, direction) {
        (Some(rank), SortDirection::Asc) => rank,
        (Some(rank), SortDirection::Desc) => table_len(kind) + 1 - rank,
        (None, SortDirection::Asc) => UNRANKED_ASC,
        (None, SortDirection::Desc) => UNRANKED_DESC,
    }
}

/// Stable in-memory sort by rank
///
/// Items with equal rank keep their relative input order.
pub fn sort_by_rank<T: Ranked>(items: &mut [T], kind: RankKind, direction: SortDirection) {
    items.sort_by_key(|item| rank(kind, item.rank_label(kind), direction));
}

fn table_len(kind: RankKind) -> u32 {
    match kind {
        RankKind::Priority => PRIORITY_ORDER.len() as u32,
        RankKind::Status => STATUS_ORDER.len() as u32,
    }
}

fn position<T: PartialEq>(table: &[T], value: &T) -> u32 {
    table
        .iter()
        .position(|candidate| candidate == value)
        .map(|index| index as u32 + 1)
        .unwrap_or(UNRANKED_ASC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        status: &'static str,
        priority: &'static str,
    }

    impl Ranked for Row {
        fn status_label(&self) -> &str {
            self.status
        }

        fn priority_label(&self) -> &str {
            self.priority
        }
    }

    fn row(name: &'static str, status: &'static str, priority: &'static str) -> Row {
        Row { name, status, priority }
    }

    fn names(rows: &[Row]) -> Vec<&'static str> {
        rows.iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_priority_rank_table() {
        assert_eq!(rank(RankKind::Priority, "Urgent", SortDirection::Asc), 1);
        assert_eq!(rank(RankKind::Priority, "High", SortDirection::Asc), 2);
        assert_eq!(rank(RankKind::Priority, "Medium", SortDirection::Asc), 3);
        assert_eq!(rank(RankKind::Priority, "Low", SortDirection::Asc), 4);

        assert_eq!(rank(RankKind::Priority, "Urgent", SortDirection::Desc), 4);
        assert_eq!(rank(RankKind::Priority, "Low", SortDirection::Desc), 1);
    }

    #[test]
    fn test_status_rank_table() {
        assert_eq!(rank(RankKind::Status, "Done", SortDirection::Asc), 1);
        assert_eq!(rank(RankKind::Status, "In progress", SortDirection::Asc), 2);
        assert_eq!(rank(RankKind::Status, "To do", SortDirection::Asc), 3);
        assert_eq!(rank(RankKind::Status, "Backlog", SortDirection::Asc), 4);

        assert_eq!(rank(RankKind::Status, "Done", SortDirection::Desc), 4);
        assert_eq!(rank(RankKind::Status, "Backlog", SortDirection::Desc), 1);
    }

    #[test]
    fn test_unmapped_labels() {
        assert_eq!(rank(RankKind::Priority, "Someday", SortDirection::Asc), UNRANKED_ASC);
        assert_eq!(rank(RankKind::Priority, "Someday", SortDirection::Desc), UNRANKED_DESC);
        assert_eq!(rank(RankKind::Status, "Archived", SortDirection::Asc), UNRANKED_ASC);
        assert_eq!(rank(RankKind::Status, "Archived", SortDirection::Desc), UNRANKED_DESC);
    }

    #[test]
    fn test_sort_by_priority_ascending_is_stable() {
        let mut rows = vec![
            row("low-a", "Backlog", "Low"),
            row("urgent-a", "Backlog", "Urgent"),
            row("medium", "Backlog", "Medium"),
            row("low-b", "Backlog", "Low"),
            row("high", "Backlog", "High"),
            row("urgent-b", "Backlog", "Urgent"),
        ];

        sort_by_rank(&mut rows, RankKind::Priority, SortDirection::Asc);

        assert_eq!(
            names(&rows),
            vec!["urgent-a", "urgent-b", "high", "medium", "low-a", "low-b"]
        );
    }

    #[test]
    fn test_sort_by_priority_descending_reverses_groups() {
        let mut rows = vec![
            row("urgent", "Backlog", "Urgent"),
            row("low", "Backlog", "Low"),
            row("high", "Backlog", "High"),
            row("medium", "Backlog", "Medium"),
        ];

        sort_by_rank(&mut rows, RankKind::Priority, SortDirection::Desc);

        assert_eq!(names(&rows), vec!["low", "medium", "high", "urgent"]);
    }

    #[test]
    fn test_sort_by_status_both_directions() {
        let rows = vec![
            row("backlog", "Backlog", "Low"),
            row("todo", "To do", "Low"),
            row("done", "Done", "Low"),
            row("progress", "In progress", "Low"),
        ];

        let mut ascending = rows.clone();
        sort_by_rank(&mut ascending, RankKind::Status, SortDirection::Asc);
        assert_eq!(names(&ascending), vec!["done", "progress", "todo", "backlog"]);

        let mut descending = rows;
        sort_by_rank(&mut descending, RankKind::Status, SortDirection::Desc);
        assert_eq!(names(&descending), vec!["backlog", "todo", "progress", "done"]);
    }

    #[test]
    fn test_unmapped_sorts_last_ascending_first_descending() {
        let rows = vec![
            row("odd", "Archived", "Low"),
            row("done", "Done", "Low"),
            row("backlog", "Backlog", "Low"),
        ];

        let mut ascending = rows.clone();
        sort_by_rank(&mut ascending, RankKind::Status, SortDirection::Asc);
        assert_eq!(names(&ascending), vec!["done", "backlog", "odd"]);

        let mut descending = rows;
        sort_by_rank(&mut descending, RankKind::Status, SortDirection::Desc);
        assert_eq!(names(&descending), vec!["odd", "backlog", "done"]);
    }
}

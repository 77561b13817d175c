/// Project report aggregates
///
/// Pure computation over a project's tasks and a reference instant:
///
/// - `top_by_deadline`: the 3 earliest deadlines (tasks without one excluded)
/// - `top_by_priority`: the 3 most urgent tasks by priority rank
/// - `overdue`: past-due tasks that are not done, earliest deadline first
/// - `total_done` and `completion_rate` (percent, one decimal)
///
/// All orderings are stable, so ties keep the input order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::listing::ranking::{sort_by_rank, RankKind};
use crate::listing::sort::SortDirection;
use crate::models::task::Task;

/// Size of the "top" lists
pub const TOP_N: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub total_tasks: usize,
    pub top_by_deadline: Vec<Task>,
    pub top_by_priority: Vec<Task>,
    pub overdue: Vec<Task>,
    pub total_done: usize,
    pub completion_rate: f64,
}

/// Builds the report for `tasks` as seen at `now`
pub fn aggregate(tasks: &[Task], now: DateTime<Utc>) -> ProjectReport {
    let mut by_deadline: Vec<Task> = tasks.iter().filter(|t| t.due_date.is_some()).cloned().collect();
    by_deadline.sort_by_key(|t| t.due_date);
    by_deadline.truncate(TOP_N);

    let mut by_priority = tasks.to_vec();
    sort_by_rank(&mut by_priority, RankKind::Priority, SortDirection::Asc);
    by_priority.truncate(TOP_N);

    let total_done = tasks.iter().filter(|t| t.is_done()).count();

    ProjectReport {
        total_tasks: tasks.len(),
        top_by_deadline: by_deadline,
        top_by_priority: by_priority,
        overdue: overdue(tasks, now),
        total_done,
        completion_rate: completion_rate(total_done, tasks.len()),
    }
}

/// Past-due, not-done tasks, earliest deadline first
pub fn overdue(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    let mut overdue: Vec<Task> = tasks.iter().filter(|t| t.is_overdue(now)).cloned().collect();
    overdue.sort_by_key(|t| t.due_date);
    overdue
}

/// `done / total` as a percentage rounded to one decimal; 0 for no tasks
pub fn completion_rate(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (done as f64 / total as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn task(name: &str, status: &str, priority: &str, due_in_days: Option<i64>) -> Task {
        Task {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            status: status.to_string(),
            priority: priority.to_string(),
            due_date: due_in_days.map(|days| now() + Duration::days(days)),
            creator_id: None,
            assignee_id: None,
            created_at: now() - Duration::days(30),
        }
    }

    fn names(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_empty_project() {
        let report = aggregate(&[], now());

        assert_eq!(report.total_tasks, 0);
        assert_eq!(report.total_done, 0);
        assert_eq!(report.completion_rate, 0.0);
        assert!(report.top_by_deadline.is_empty());
        assert!(report.overdue.is_empty());
    }

    #[test]
    fn test_three_task_project() {
        let tasks = vec![
            task("T1", "Backlog", "Low", Some(10)),
            task("T2", "Backlog", "Urgent", Some(1)),
            task("T3", "To do", "Medium", Some(-2)),
        ];

        let report = aggregate(&tasks, now());

        assert_eq!(names(&report.top_by_priority), vec!["T2", "T3", "T1"]);
        assert_eq!(names(&report.overdue), vec!["T3"]);
        assert_eq!(names(&report.top_by_deadline), vec!["T3", "T2", "T1"]);
        assert_eq!(report.total_done, 0);
        assert_eq!(report.completion_rate, 0.0);
    }

    #[test]
    fn test_completion_rate_rounding() {
        assert_eq!(completion_rate(1, 4), 25.0);
        assert_eq!(completion_rate(1, 3), 33.3);
        assert_eq!(completion_rate(2, 3), 66.7);
        assert_eq!(completion_rate(3, 3), 100.0);
        assert_eq!(completion_rate(0, 0), 0.0);
    }

    #[test]
    fn test_overdue_excludes_done_and_future() {
        let tasks = vec![
            task("late-2", "In progress", "Low", Some(-2)),
            task("done-late", "Done", "Low", Some(-10)),
            task("future", "To do", "Low", Some(3)),
            task("late-7", "Backlog", "High", Some(-7)),
            task("no-deadline", "To do", "Low", None),
        ];

        let late = overdue(&tasks, now());

        assert_eq!(names(&late), vec!["late-7", "late-2"]);
    }

    #[test]
    fn test_top_lists_are_capped_and_stable() {
        let tasks = vec![
            task("a", "Backlog", "High", Some(5)),
            task("b", "Backlog", "High", Some(5)),
            task("c", "Backlog", "High", None),
            task("d", "Backlog", "Urgent", Some(9)),
            task("e", "Done", "Low", Some(1)),
        ];

        let report = aggregate(&tasks, now());

        assert_eq!(names(&report.top_by_priority), vec!["d", "a", "b"]);
        assert_eq!(names(&report.top_by_deadline), vec!["e", "a", "b"]);
        assert_eq!(report.total_done, 1);
        assert_eq!(report.completion_rate, 20.0);
    }

    #[test]
    fn test_unmapped_priority_ranks_last() {
        let tasks = vec![
            task("odd", "Backlog", "Someday", None),
            task("low", "Backlog", "Low", None),
        ];

        let report = aggregate(&tasks, now());

        assert_eq!(names(&report.top_by_priority), vec!["low", "odd"]);
    }
}

/// List query parameters and typed filters
///
/// Every list endpoint accepts the same flat query string:
///
/// ```text
/// ?status=To%20do&priority=High&due_from=2025-01-01&due_to=2025-01-31
///  &project_id=<uuid>&assignee_id=<uuid>&creator_id=<uuid>&q=report
///  &sort=due_date&order=desc&page=2
/// ```
///
/// Values are kept as raw strings in [`ListParams`] so that a malformed value
/// never rejects the request. [`TaskFilter::from_params`] and
/// [`ProjectFilter::from_params`] keep what parses and drop the rest.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::workflow::{Priority, Status};

/// Raw list query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub project_id: Option<String>,
    pub assignee_id: Option<String>,
    pub creator_id: Option<String>,
    pub due_from: Option<String>,
    pub due_to: Option<String>,
    pub q: Option<String>,
}

impl ListParams {
    /// Requested page number
    ///
    /// Missing or malformed values mean page 1. Zero and negative values are
    /// out of range and come back as 0, which selects an empty page.
    pub fn page(&self) -> u64 {
        parse_page(self.page.as_deref())
    }
}

/// Filters applicable to task collections, AND-combined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Option<Uuid>,
    /// Inclusive lower bound on the due date
    pub due_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the due date
    pub due_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring of name or description
    pub q: Option<String>,
}

impl TaskFilter {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            status: non_blank(&params.status).and_then(Status::parse),
            priority: non_blank(&params.priority).and_then(Priority::parse),
            project_id: parse_uuid(&params.project_id),
            assignee_id: parse_uuid(&params.assignee_id),
            creator_id: parse_uuid(&params.creator_id),
            due_from: non_blank(&params.due_from).and_then(|v| parse_bound(v, Bound::Start)),
            due_to: non_blank(&params.due_to).and_then(|v| parse_bound(v, Bound::End)),
            q: non_blank(&params.q).map(str::to_string),
        }
    }
}

/// Filters applicable to the project collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub creator_id: Option<Uuid>,
    pub q: Option<String>,
}

impl ProjectFilter {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            status: non_blank(&params.status).and_then(Status::parse),
            priority: non_blank(&params.priority).and_then(Priority::parse),
            creator_id: parse_uuid(&params.creator_id),
            q: non_blank(&params.q).map(str::to_string),
        }
    }
}

/// Parses a `page` query value (see [`ListParams::page`])
pub fn parse_page(raw: Option<&str>) -> u64 {
    match raw.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(page)) if page > 0 => page as u64,
        Some(Ok(_)) => 0,
        _ => 1,
    }
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards escaped
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Start,
    End,
}

/// RFC 3339 timestamp, or a plain date covering the whole UTC day
fn parse_bound(value: &str, bound: Bound) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)?,
    };

    Some(date.and_time(time).and_utc())
}

fn parse_uuid(value: &Option<String>) -> Option<Uuid> {
    non_blank(value).and_then(|v| Uuid::parse_str(v).ok())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params() -> ListParams {
        ListParams::default()
    }

    #[test]
    fn test_page_parsing() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some(" 2 ")), 2);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("")), 1);
        assert_eq!(parse_page(Some("0")), 0);
        assert_eq!(parse_page(Some("-4")), 0);
    }

    #[test]
    fn test_valid_filters_are_kept() {
        let project = Uuid::new_v4();
        let filter = TaskFilter::from_params(&ListParams {
            status: Some("in progress".to_string()),
            priority: Some("Urgent".to_string()),
            project_id: Some(project.to_string()),
            q: Some("  report ".to_string()),
            ..params()
        });

        assert_eq!(filter.status, Some(Status::InProgress));
        assert_eq!(filter.priority, Some(Priority::Urgent));
        assert_eq!(filter.project_id, Some(project));
        assert_eq!(filter.q.as_deref(), Some("report"));
    }

    #[test]
    fn test_unparseable_filters_are_ignored() {
        let filter = TaskFilter::from_params(&ListParams {
            status: Some("Archived".to_string()),
            priority: Some("".to_string()),
            assignee_id: Some("not-a-uuid".to_string()),
            due_from: Some("yesterday".to_string()),
            q: Some("   ".to_string()),
            ..params()
        });

        assert_eq!(filter, TaskFilter::default());
    }

    #[test]
    fn test_date_only_bounds_cover_whole_day() {
        let filter = TaskFilter::from_params(&ListParams {
            due_from: Some("2025-03-01".to_string()),
            due_to: Some("2025-03-31".to_string()),
            ..params()
        });

        assert_eq!(
            filter.due_from,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );

        let to = filter.due_to.unwrap();
        assert!(to > Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap());
        assert!(to < Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_rfc3339_bound() {
        let filter = TaskFilter::from_params(&ListParams {
            due_to: Some("2025-03-31T12:00:00+02:00".to_string()),
            ..params()
        });

        assert_eq!(
            filter.due_to,
            Some(Utc.with_ymd_and_hms(2025, 3, 31, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_project_filter() {
        let filter = ProjectFilter::from_params(&ListParams {
            status: Some("Done".to_string()),
            creator_id: Some("garbage".to_string()),
            ..params()
        });

        assert_eq!(filter.status, Some(Status::Done));
        assert_eq!(filter.creator_id, None);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("report"), "%report%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}

/// Workflow enums shared by projects and tasks
///
/// Both projects and tasks carry a [`Status`] and a [`Priority`]. The database
/// stores the human labels (`"To do"`, `"Urgent"`, ...) in TEXT columns and the
/// row structs keep them as `String`, so a legacy or hand-edited label that no
/// longer maps to a variant is still readable. Use [`Status::parse`] /
/// [`Priority::parse`] to get the typed value back.
///
/// # Example
///
/// ```
/// use taskboard_shared::models::workflow::{Priority, Status};
///
/// assert_eq!(Status::parse("in progress"), Some(Status::InProgress));
/// assert_eq!(Status::InProgress.as_str(), "In progress");
/// assert_eq!(Priority::parse("URGENT"), Some(Priority::Urgent));
/// assert_eq!(Priority::parse("someday"), None);
/// ```

use serde::{Deserialize, Serialize};

/// Progress state of a project or task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Not scheduled yet
    #[default]
    #[serde(rename = "Backlog")]
    Backlog,

    /// Scheduled, not started
    #[serde(rename = "To do")]
    ToDo,

    /// Being worked on
    #[serde(rename = "In progress")]
    InProgress,

    /// Finished
    #[serde(rename = "Done")]
    Done,
}

impl Status {
    /// All statuses in workflow order
    pub const ALL: [Status; 4] = [Status::Backlog, Status::ToDo, Status::InProgress, Status::Done];

    /// Label stored in the database and shown to users
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Backlog => "Backlog",
            Status::ToDo => "To do",
            Status::InProgress => "In progress",
            Status::Done => "Done",
        }
    }

    /// Parses a label leniently
    ///
    /// Case, surrounding whitespace and the separator between words
    /// (space, `-`, `_` or none) are ignored, so `"to-do"`, `"TO_DO"` and
    /// `"todo"` all map to [`Status::ToDo`].
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "backlog" => Some(Status::Backlog),
            "todo" => Some(Status::ToDo),
            "inprogress" => Some(Status::InProgress),
            "done" => Some(Status::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of a project or task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// All priorities from least to most urgent
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    /// Label stored in the database and shown to users
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }

    /// Parses a label, ignoring case and surrounding whitespace
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Spreadsheet export of a project report
///
/// Export happens in two steps. [`ReportWorkbook::build`] turns a project,
/// its tasks and the people involved into a plain model of every sheet; it is
/// deterministic for identical input and `now`. [`ReportWorkbook::to_xlsx`]
/// then renders that model with `rust_xlsxwriter`.
///
/// # Sheets
///
/// ```text
/// Summary        title, generation time, totals, completion rate
/// All Tasks      one row per task, overdue rows highlighted
/// Overdue Tasks  only when something is overdue, with whole days late
/// By Status      count per status label
/// ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;
use uuid::Uuid;

use super::aggregate::{aggregate, overdue};
use crate::models::project::Project;
use crate::models::task::Task;
use crate::models::user::UserSummary;
use crate::models::workflow::Status;

/// MIME type of the exported file
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const SUMMARY_SHEET: &str = "Summary";
pub const ALL_TASKS_SHEET: &str = "All Tasks";
pub const OVERDUE_SHEET: &str = "Overdue Tasks";
pub const BY_STATUS_SHEET: &str = "By Status";

const ALL_TASKS_HEADER: [&str; 7] = ["Task", "Status", "Priority", "Assignee", "Creator", "Due Date", "Created"];
const OVERDUE_HEADER: [&str; 4] = ["Task", "Assignee", "Due Date", "Days Overdue"];
const BY_STATUS_HEADER: [&str; 2] = ["Status", "Count"];

const HEADER_FILL: u32 = 0xD9E1F2;
const OVERDUE_FILL: u32 = 0xFFC7CE;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to render spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),
}

/// Summary sheet content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySheet {
    pub title: String,
    pub generated_at: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    /// Formatted, e.g. `"25.0%"`
    pub completion_rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub name: String,
    pub status: String,
    pub priority: String,
    pub assignee: String,
    pub creator: String,
    pub due_date: String,
    pub created: String,
    /// Rendered with a highlighted background
    pub overdue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueRow {
    pub name: String,
    pub assignee: String,
    pub due_date: String,
    pub days_overdue: i64,
}

/// Everything the exported workbook contains
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportWorkbook {
    pub summary: SummarySheet,
    pub tasks: Vec<TaskRow>,
    /// None when no task is overdue; the sheet is then left out
    pub overdue: Option<Vec<OverdueRow>>,
    pub by_status: Vec<(String, usize)>,
}

impl ReportWorkbook {
    /// Builds the workbook model
    ///
    /// `people` maps user IDs to their summaries; missing users are treated
    /// like unset references.
    pub fn build(
        project: &Project,
        tasks: &[Task],
        people: &HashMap<Uuid, UserSummary>,
        now: DateTime<Utc>,
    ) -> Self {
        let report = aggregate(tasks, now);
        let name_of = |id: Option<Uuid>, fallback: &str| {
            id.and_then(|id| people.get(&id))
                .map(UserSummary::display_name)
                .unwrap_or_else(|| fallback.to_string())
        };

        let summary = SummarySheet {
            title: format!("Project Report: {}", project.name),
            generated_at: now.format("%Y-%m-%d %H:%M").to_string(),
            total_tasks: report.total_tasks,
            completed_tasks: report.total_done,
            overdue_tasks: report.overdue.len(),
            completion_rate: format!("{:.1}%", report.completion_rate),
        };

        let rows = tasks
            .iter()
            .map(|task| TaskRow {
                name: task.name.clone(),
                status: task.status.clone(),
                priority: task.priority.clone(),
                assignee: name_of(task.assignee_id, "Unassigned"),
                creator: name_of(task.creator_id, "N/A"),
                due_date: task
                    .due_date
                    .map(|due| due.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "No deadline".to_string()),
                created: task.created_at.format("%Y-%m-%d %H:%M").to_string(),
                overdue: task.is_overdue(now),
            })
            .collect();

        let late: Vec<OverdueRow> = overdue(tasks, now)
            .iter()
            .filter_map(|task| {
                let due = task.due_date?;
                Some(OverdueRow {
                    name: task.name.clone(),
                    assignee: name_of(task.assignee_id, "Unassigned"),
                    due_date: due.format("%Y-%m-%d").to_string(),
                    days_overdue: (now.date_naive() - due.date_naive()).num_days(),
                })
            })
            .collect();

        Self {
            summary,
            tasks: rows,
            overdue: (!late.is_empty()).then_some(late),
            by_status: status_counts(tasks),
        }
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&'static str> {
        let mut names = vec![SUMMARY_SHEET, ALL_TASKS_SHEET];
        if self.overdue.is_some() {
            names.push(OVERDUE_SHEET);
        }
        names.push(BY_STATUS_SHEET);
        names
    }

    /// Renders the workbook as xlsx bytes
    pub fn to_xlsx(&self) -> Result<Vec<u8>, ReportError> {
        let mut workbook = Workbook::new();

        let bold = Format::new().set_bold();
        let title = Format::new().set_bold().set_font_size(14);
        let header = Format::new().set_bold().set_background_color(Color::RGB(HEADER_FILL));
        let highlight = Format::new().set_background_color(Color::RGB(OVERDUE_FILL));

        let sheet = workbook.add_worksheet();
        sheet.set_name(SUMMARY_SHEET)?;
        sheet.write_string_with_format(0, 0, &self.summary.title, &title)?;
        sheet.write_string(1, 0, format!("Generated: {}", self.summary.generated_at))?;
        let totals = [
            ("Total Tasks", self.summary.total_tasks),
            ("Completed Tasks", self.summary.completed_tasks),
            ("Overdue Tasks", self.summary.overdue_tasks),
        ];
        for (offset, (label, value)) in totals.iter().enumerate() {
            let row = 3 + offset as u32;
            sheet.write_string_with_format(row, 0, *label, &bold)?;
            sheet.write_number(row, 1, *value as f64)?;
        }
        sheet.write_string_with_format(6, 0, "Completion Rate", &bold)?;
        sheet.write_string(6, 1, &self.summary.completion_rate)?;
        sheet.set_column_width(0, 20)?;
        sheet.set_column_width(1, 16)?;

        let sheet = workbook.add_worksheet();
        sheet.set_name(ALL_TASKS_SHEET)?;
        write_header(sheet, &ALL_TASKS_HEADER, &header)?;
        for (index, task) in self.tasks.iter().enumerate() {
            let row = 1 + index as u32;
            let cells = [
                &task.name,
                &task.status,
                &task.priority,
                &task.assignee,
                &task.creator,
                &task.due_date,
                &task.created,
            ];
            for (col, value) in cells.iter().enumerate() {
                let col = col as u16;
                if task.overdue {
                    sheet.write_string_with_format(row, col, *value, &highlight)?;
                } else {
                    sheet.write_string(row, col, *value)?;
                }
            }
        }
        sheet.set_column_width(0, 32)?;
        for col in 1..ALL_TASKS_HEADER.len() as u16 {
            sheet.set_column_width(col, 18)?;
        }

        if let Some(late) = &self.overdue {
            let sheet = workbook.add_worksheet();
            sheet.set_name(OVERDUE_SHEET)?;
            write_header(sheet, &OVERDUE_HEADER, &header)?;
            for (index, task) in late.iter().enumerate() {
                let row = 1 + index as u32;
                sheet.write_string(row, 0, &task.name)?;
                sheet.write_string(row, 1, &task.assignee)?;
                sheet.write_string(row, 2, &task.due_date)?;
                sheet.write_number(row, 3, task.days_overdue as f64)?;
            }
            sheet.set_column_width(0, 32)?;
            sheet.set_column_width(1, 24)?;
            sheet.set_column_width(2, 14)?;
            sheet.set_column_width(3, 14)?;
        }

        let sheet = workbook.add_worksheet();
        sheet.set_name(BY_STATUS_SHEET)?;
        write_header(sheet, &BY_STATUS_HEADER, &header)?;
        for (index, (status, count)) in self.by_status.iter().enumerate() {
            let row = 1 + index as u32;
            sheet.write_string(row, 0, status)?;
            sheet.write_number(row, 1, *count as f64)?;
        }
        sheet.set_column_width(0, 18)?;

        Ok(workbook.save_to_buffer()?)
    }
}

/// `Report_<project name>_<YYYYMMDD>.xlsx`
///
/// Spaces become `_`; quotes and path separators are replaced as well so the
/// name is safe inside a `Content-Disposition` header.
pub fn report_filename(project_name: &str, now: DateTime<Utc>) -> String {
    let name: String = project_name
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '"' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    format!("Report_{}_{}.xlsx", name, now.format("%Y%m%d"))
}

/// Task count per status label
///
/// Known statuses come first in workflow order (only those present), then
/// any unmapped labels alphabetically.
fn status_counts(tasks: &[Task]) -> Vec<(String, usize)> {
    let mut known: BTreeMap<usize, usize> = BTreeMap::new();
    let mut unknown: BTreeMap<String, usize> = BTreeMap::new();

    for task in tasks {
        match Status::parse(&task.status).and_then(|s| Status::ALL.iter().position(|v| *v == s)) {
            Some(index) => *known.entry(index).or_default() += 1,
            None => *unknown.entry(task.status.clone()).or_default() += 1,
        }
    }

    known
        .into_iter()
        .map(|(index, count)| (Status::ALL[index].as_str().to_string(), count))
        .chain(unknown)
        .collect()
}

fn write_header(sheet: &mut Worksheet, titles: &[&str], format: &Format) -> Result<(), XlsxError> {
    for (col, title) in titles.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, format)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 30, 0).unwrap()
    }

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Q3 Launch".to_string(),
            description: String::new(),
            status: "In progress".to_string(),
            priority: "High".to_string(),
            task_count: 0,
            creator_id: None,
            created_at: now() - Duration::days(60),
        }
    }

    fn task(name: &str, status: &str, due: Option<DateTime<Utc>>) -> Task {
        Task {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            status: status.to_string(),
            priority: "Medium".to_string(),
            due_date: due,
            creator_id: None,
            assignee_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 8, 5, 0).unwrap(),
        }
    }

    fn person(first: &str, last: &str, email: &str) -> UserSummary {
        UserSummary {
            id: Uuid::new_v4(),
            email: email.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    #[test]
    fn test_no_overdue_sheet_without_overdue_tasks() {
        let tasks = vec![
            task("future", "To do", Some(now() + Duration::days(3))),
            task("done-late", "Done", Some(now() - Duration::days(3))),
        ];

        let workbook = ReportWorkbook::build(&project(), &tasks, &HashMap::new(), now());

        assert!(workbook.overdue.is_none());
        assert_eq!(workbook.sheet_names(), vec![SUMMARY_SHEET, ALL_TASKS_SHEET, BY_STATUS_SHEET]);
        assert!(workbook.tasks.iter().all(|row| !row.overdue));
    }

    #[test]
    fn test_overdue_sheet_counts_whole_days() {
        let tasks = vec![
            task("five-days", "In progress", Some(now() - Duration::days(5))),
            task("future", "To do", Some(now() + Duration::days(1))),
        ];

        let workbook = ReportWorkbook::build(&project(), &tasks, &HashMap::new(), now());

        let late = workbook.overdue.as_ref().unwrap();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].name, "five-days");
        assert_eq!(late[0].days_overdue, 5);
        assert_eq!(late[0].due_date, "2025-06-10");
        assert!(workbook.sheet_names().contains(&OVERDUE_SHEET));
        assert!(workbook.tasks[0].overdue);
        assert!(!workbook.tasks[1].overdue);
    }

    #[test]
    fn test_summary_values() {
        let tasks = vec![
            task("a", "Done", None),
            task("b", "To do", None),
            task("c", "Backlog", None),
            task("d", "In progress", Some(now() - Duration::hours(2))),
        ];

        let summary = ReportWorkbook::build(&project(), &tasks, &HashMap::new(), now()).summary;

        assert_eq!(summary.title, "Project Report: Q3 Launch");
        assert_eq!(summary.generated_at, "2025-06-15 09:30");
        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.completed_tasks, 1);
        assert_eq!(summary.overdue_tasks, 1);
        assert_eq!(summary.completion_rate, "25.0%");
    }

    #[test]
    fn test_people_fallbacks() {
        let named = person("Ada", "Lovelace", "ada@example.com");
        let nameless = person("", "", "grace@example.com");
        let mut people = HashMap::new();
        people.insert(named.id, named.clone());
        people.insert(nameless.id, nameless.clone());

        let mut assigned = task("assigned", "To do", None);
        assigned.assignee_id = Some(named.id);
        assigned.creator_id = Some(nameless.id);
        let orphan = task("orphan", "To do", None);

        let workbook = ReportWorkbook::build(&project(), &[assigned, orphan], &people, now());

        assert_eq!(workbook.tasks[0].assignee, "Ada Lovelace");
        assert_eq!(workbook.tasks[0].creator, "grace@example.com");
        assert_eq!(workbook.tasks[1].assignee, "Unassigned");
        assert_eq!(workbook.tasks[1].creator, "N/A");
        assert_eq!(workbook.tasks[1].due_date, "No deadline");
        assert_eq!(workbook.tasks[1].created, "2025-05-01 08:05");
    }

    #[test]
    fn test_status_counts_order() {
        let tasks = vec![
            task("a", "Done", None),
            task("b", "Zombie", None),
            task("c", "Backlog", None),
            task("d", "Done", None),
            task("e", "Archived", None),
        ];

        assert_eq!(
            status_counts(&tasks),
            vec![
                ("Backlog".to_string(), 1),
                ("Done".to_string(), 2),
                ("Archived".to_string(), 1),
                ("Zombie".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let tasks = vec![task("a", "To do", Some(now() - Duration::days(1)))];
        let p = project();

        let first = ReportWorkbook::build(&p, &tasks, &HashMap::new(), now());
        let second = ReportWorkbook::build(&p, &tasks, &HashMap::new(), now());

        assert_eq!(first, second);
    }

    #[test]
    fn test_to_xlsx_produces_zip_archive() {
        let tasks = vec![
            task("late", "To do", Some(now() - Duration::days(2))),
            task("fine", "Done", None),
        ];
        let workbook = ReportWorkbook::build(&project(), &tasks, &HashMap::new(), now());

        let bytes = workbook.to_xlsx().unwrap();

        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(report_filename("Q3 Launch", now()), "Report_Q3_Launch_20250615.xlsx");
        assert_eq!(report_filename("a\"b/c", now()), "Report_a_b_c_20250615.xlsx");
    }
}

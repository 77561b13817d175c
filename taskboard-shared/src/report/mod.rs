/// Project reports
///
/// - `aggregate`: top-N lists, overdue detection and completion rate
/// - `export`: the xlsx workbook built from those aggregates

pub mod aggregate;
pub mod export;

pub use aggregate::{aggregate, ProjectReport};
pub use export::{report_filename, ReportError, ReportWorkbook, XLSX_CONTENT_TYPE};

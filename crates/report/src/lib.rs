//! Spreadsheet report generation for custody alerts.
//!
//! This crate provides:
//! - sheet label sanitising (`sheet_label`)
//! - deterministic grouping of records into sheets (`group_by`)
//! - column projection against the loaded schema
//! - the xlsx workbook writer

pub mod columns;
pub mod error;
pub mod grouping;
pub mod labels;
pub mod workbook;

pub use columns::{project, DASHBOARD_ALERT_COLUMNS, DEFAULT_ALERT_COLUMNS};
pub use error::ReportError;
pub use grouping::{group_by, SheetGroup};
pub use labels::sheet_label;
pub use workbook::{build_grouped, build_single, Report, SheetSummary, EXPORT_SHEET_NAME, XLSX_CONTENT_TYPE};

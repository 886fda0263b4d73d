//! Scheduled custody alert run: load, classify, build the grouped report,
//! keep a dated copy on disk, then email it.

pub mod error;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{email_dispatcher, run, ReportSummary, RunOutcome};

use std::path::PathBuf;

use custodia_core::ConfigError;
use custodia_ingest::DataLoadError;
use custodia_notify::NotifyError;
use custodia_report::ReportError;

/// Fatal failures of an alert run. Each maps to the step that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to load custody records: {0}")]
    Load(#[from] DataLoadError),

    #[error("failed to build report: {0}")]
    Report(#[from] ReportError),

    #[error("failed to write report to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render email: {0}")]
    Template(#[source] NotifyError),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The artifact stays on disk so the report can be resent by hand.
    #[error("report delivery failed: {reason} (report kept at {})", artifact.display())]
    Transport { artifact: PathBuf, reason: String },
}

impl PipelineError {
    /// Short name of the failing step, for operator logs.
    pub fn step(&self) -> &'static str {
        match self {
            PipelineError::Load(_) => "load",
            PipelineError::Report(_) => "report",
            PipelineError::Persist { .. } => "persist",
            PipelineError::Template(_) => "template",
            PipelineError::Config(_) => "config",
            PipelineError::Transport { .. } => "dispatch",
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

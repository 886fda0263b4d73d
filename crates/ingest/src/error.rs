use std::path::PathBuf;

use thiserror::Error;

/// Fatal problems reading the source table. Any of these aborts the run.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("source has no header row")]
    EmptyHeader,

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

//! Loading of custody records from the delimited source file.
//!
//! This crate provides:
//! - `CsvImporter`, which validates the header against the configured schema
//!   and derives custody days once per load
//! - explicit, configured date-format parsing
//! - `RecordCache`, an mtime-keyed read cache for the reporting view

pub mod cache;
pub mod csv_import;
pub mod dates;
pub mod error;

pub use cache::RecordCache;
pub use csv_import::CsvImporter;
pub use error::DataLoadError;

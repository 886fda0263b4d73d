//! Classification and aggregation over custody records.
//!
//! This crate provides:
//! - the threshold classifier (`classify`, `AlertState`)
//! - the filter composer used by the reporting view
//! - per-unit summary counts and chart aggregations

pub mod classify;
pub mod filters;
pub mod summary;
pub mod trends;

pub use classify::{alert_state, classify, AlertState};
pub use filters::{FilterOptions, RecordFilter};
pub use summary::{summarize, UnitSummary};
pub use trends::{LabelCount, OriginStateCount, TrendReport};

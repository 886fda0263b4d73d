//! Threshold classification of custody records.
//!
//! Pure functions over borrowed records: input order is preserved and the
//! base set is never touched.

use serde::Serialize;

use custodia_core::{Threshold, VehicleRecord};

/// Where a record stands relative to the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Alerting,
    WithinLimit,
    /// Entry date missing or unparseable.
    Unknown,
}

pub fn alert_state(record: &VehicleRecord, threshold: Threshold) -> AlertState {
    match record.custody_days() {
        Some(days) if threshold.is_exceeded_by(days) => AlertState::Alerting,
        Some(_) => AlertState::WithinLimit,
        None => AlertState::Unknown,
    }
}

/// Records whose custody exceeds `threshold`, in input order.
/// Unknown custody durations never alert.
pub fn classify<'a, I>(records: I, threshold: Threshold) -> Vec<&'a VehicleRecord>
where
    I: IntoIterator<Item = &'a VehicleRecord>,
{
    records
        .into_iter()
        .filter(|r| alert_state(r, threshold) == AlertState::Alerting)
        .collect()
}

//! Per-unit counts for the summary cards.

use std::collections::BTreeMap;

use serde::Serialize;

use custodia_core::{GroupKey, Threshold, VehicleRecord};

use crate::classify::{alert_state, AlertState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    pub unit: String,
    /// Every record of the unit, including unknown custody.
    pub total_count: usize,
    pub alert_count: usize,
    pub unknown_count: usize,
}

/// Count records and alerts per value of `key`, sorted by unit label.
/// Records with a blank key are counted under the unassigned label.
pub fn summarize<'a, I>(records: I, key: GroupKey, threshold: Threshold) -> Vec<UnitSummary>
where
    I: IntoIterator<Item = &'a VehicleRecord>,
{
    let mut by_unit: BTreeMap<&str, UnitSummary> = BTreeMap::new();

    for record in records {
        let label = record.key_label(key);
        let entry = by_unit.entry(label).or_insert_with(|| UnitSummary {
            unit: label.to_string(),
            total_count: 0,
            alert_count: 0,
            unknown_count: 0,
        });
        entry.total_count += 1;
        match alert_state(record, threshold) {
            AlertState::Alerting => entry.alert_count += 1,
            AlertState::Unknown => entry.unknown_count += 1,
            AlertState::WithinLimit => {}
        }
    }

    by_unit.into_values().collect()
}

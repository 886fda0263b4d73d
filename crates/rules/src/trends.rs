//! Aggregations behind the dashboard charts: per-key counts, intake over
//! time, and origin broken down by alert state.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use custodia_core::{GroupKey, Threshold, VehicleRecord};

use crate::classify::{alert_state, AlertState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OriginStateCount {
    pub origin: String,
    pub state: AlertState,
    pub count: usize,
}

/// All chart series for one filtered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendReport {
    pub by_regional_unit: Vec<LabelCount>,
    pub by_parent_unit: Vec<LabelCount>,
    pub intake_by_year: Vec<LabelCount>,
    pub intake_by_month: Vec<LabelCount>,
    pub origin_by_state: Vec<OriginStateCount>,
}

impl TrendReport {
    pub fn build<'a, I>(records: I, threshold: Threshold) -> Self
    where
        I: IntoIterator<Item = &'a VehicleRecord>,
    {
        let records: Vec<&VehicleRecord> = records.into_iter().collect();
        Self {
            by_regional_unit: count_by(records.iter().copied(), GroupKey::RegionalUnit),
            by_parent_unit: count_by(records.iter().copied(), GroupKey::ParentUnit),
            intake_by_year: intake_by_year(records.iter().copied()),
            intake_by_month: intake_by_month(records.iter().copied()),
            origin_by_state: origin_by_state(records.iter().copied(), threshold),
        }
    }
}

fn tally<K: Ord>(keys: impl Iterator<Item = K>) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Record count per key value, sorted by label.
pub fn count_by<'a, I>(records: I, key: GroupKey) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a VehicleRecord>,
{
    tally(records.into_iter().map(|r| r.key_label(key)))
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect()
}

/// Entries per calendar year. Records with unknown entry dates are skipped.
pub fn intake_by_year<'a, I>(records: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a VehicleRecord>,
{
    tally(records.into_iter().filter_map(|r| r.entry_date).map(|d| d.year()))
        .into_iter()
        .map(|(year, count)| LabelCount {
            label: year.to_string(),
            count,
        })
        .collect()
}

/// Entries per `YYYY-MM`. Records with unknown entry dates are skipped.
pub fn intake_by_month<'a, I>(records: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a VehicleRecord>,
{
    tally(
        records
            .into_iter()
            .filter_map(|r| r.entry_date)
            .map(|d| (d.year(), d.month())),
    )
    .into_iter()
    .map(|((year, month), count)| LabelCount {
        label: format!("{year:04}-{month:02}"),
        count,
    })
    .collect()
}

pub fn origin_by_state<'a, I>(records: I, threshold: Threshold) -> Vec<OriginStateCount>
where
    I: IntoIterator<Item = &'a VehicleRecord>,
{
    tally(
        records
            .into_iter()
            .map(|r| (r.key_label(GroupKey::Origin), alert_state(r, threshold))),
    )
    .into_iter()
    .map(|((origin, state), count)| OriginStateCount {
        origin: origin.to_string(),
        state,
        count,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{as_of, record, record_without_date};
    use chrono::NaiveDate;
    use custodia_core::Field;

    fn entered(y: i32, m: u32, d: u32) -> VehicleRecord {
        VehicleRecord::new("Caldas", "1")
            .with_entry_date(NaiveDate::from_ymd_opt(y, m, d), as_of())
    }

    #[test]
    fn yearly_and_monthly_intake() {
        let records = vec![
            entered(2023, 12, 5),
            entered(2024, 1, 2),
            entered(2024, 1, 30),
            entered(2024, 3, 1),
            record_without_date("Caldas", "A"),
        ];
        let years = intake_by_year(&records);
        assert_eq!(
            years,
            vec![
                LabelCount { label: "2023".into(), count: 1 },
                LabelCount { label: "2024".into(), count: 3 },
            ]
        );
        let months: Vec<(String, usize)> = intake_by_month(&records)
            .into_iter()
            .map(|c| (c.label, c.count))
            .collect();
        assert_eq!(
            months,
            vec![
                ("2023-12".to_string(), 1),
                ("2024-01".to_string(), 2),
                ("2024-03".to_string(), 1),
            ]
        );
    }

    #[test]
    fn origin_split_by_alert_state() {
        let records = vec![
            record("Caldas", "A", 200).with_text(Field::Origin, Some("Juzgado")),
            record("Caldas", "A", 20).with_text(Field::Origin, Some("Juzgado")),
            record("Caldas", "A", 400).with_text(Field::Origin, Some("Juzgado")),
            record_without_date("Caldas", "A"),
        ];
        let counts = origin_by_state(&records, Threshold::default());
        assert_eq!(
            counts,
            vec![
                OriginStateCount { origin: "Juzgado".into(), state: AlertState::Alerting, count: 2 },
                OriginStateCount { origin: "Juzgado".into(), state: AlertState::WithinLimit, count: 1 },
                OriginStateCount {
                    origin: custodia_core::UNASSIGNED_LABEL.into(),
                    state: AlertState::Unknown,
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn report_counts_cover_every_record() {
        let records = vec![
            record("Caldas", "A", 200).with_text(Field::RegionalUnit, Some("Eje Cafetero")),
            record("Caldas", "B", 20).with_text(Field::RegionalUnit, Some("Eje Cafetero")),
            record("Risaralda", "B", 20),
        ];
        let report = TrendReport::build(&records, Threshold::default());
        let total: usize = report.by_regional_unit.iter().map(|c| c.count).sum();
        assert_eq!(total, records.len());
        assert_eq!(report.by_regional_unit[0].label, "Eje Cafetero");
    }
}

//! Ad-hoc filters for the reporting view.
//!
//! Every filter is optional; active filters are AND-ed, so the order in
//! which they are applied does not matter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use custodia_core::VehicleRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Exact match on organizational unit.
    pub unit: Option<String>,
    /// Exact match on responsible party.
    #[serde(alias = "responsible")]
    pub responsible_party: Option<String>,
    /// Case-insensitive substring of the process number.
    #[serde(alias = "process")]
    pub process_number: Option<String>,
}

impl RecordFilter {
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn responsible_party(mut self, name: impl Into<String>) -> Self {
        self.responsible_party = Some(name.into());
        self
    }

    pub fn process_number(mut self, needle: impl Into<String>) -> Self {
        self.process_number = Some(needle.into());
        self
    }

    /// Blank strings mean "no filter".
    fn active(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        Self::active(&self.unit).is_none()
            && Self::active(&self.responsible_party).is_none()
            && Self::active(&self.process_number).is_none()
    }

    pub fn matches(&self, record: &VehicleRecord) -> bool {
        if let Some(unit) = Self::active(&self.unit) {
            if record.organizational_unit != unit {
                return false;
            }
        }

        if let Some(name) = Self::active(&self.responsible_party) {
            if record.responsible_party.as_deref() != Some(name) {
                return false;
            }
        }

        if let Some(needle) = Self::active(&self.process_number) {
            let needle = needle.trim().to_lowercase();
            if !record.process_number.to_lowercase().contains(&needle) {
                return false;
            }
        }

        true
    }

    /// Matching records, in input order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a VehicleRecord>
    where
        I: IntoIterator<Item = &'a VehicleRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Distinct values offered as filter choices, sorted, blanks dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub units: Vec<String>,
    pub responsible_parties: Vec<String>,
}

impl FilterOptions {
    pub fn collect<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a VehicleRecord>,
    {
        let mut units = BTreeSet::new();
        let mut parties = BTreeSet::new();
        for record in records {
            if !record.organizational_unit.is_empty() {
                units.insert(record.organizational_unit.clone());
            }
            if let Some(name) = &record.responsible_party {
                parties.insert(name.clone());
            }
        }
        Self {
            units: units.into_iter().collect(),
            responsible_parties: parties.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    fn sample() -> Vec<VehicleRecord> {
        vec![
            record("A", "B", 200).with_text(custodia_core::Field::ProcessNumber, Some("1700160001")),
            record("A", "C", 10).with_text(custodia_core::Field::ProcessNumber, Some("17001AB99")),
            record("D", "B", 300).with_text(custodia_core::Field::ProcessNumber, Some("0500160002")),
            record("A", "", 400).with_text(custodia_core::Field::ProcessNumber, Some("1700ab")),
        ]
    }

    #[test]
    fn no_filter_passes_everything() {
        let records = sample();
        let filter = RecordFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&records).len(), records.len());
    }

    #[test]
    fn blank_values_are_inactive() {
        let records = sample();
        let filter = RecordFilter::default().unit("  ").process_number("");
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&records).len(), 4);
    }

    #[test]
    fn unit_and_party_commute() {
        let records = sample();
        let by_unit = RecordFilter::default().unit("A");
        let by_party = RecordFilter::default().responsible_party("B");

        let unit_then_party = by_party.apply(by_unit.apply(&records));
        let party_then_unit = by_unit.apply(by_party.apply(&records));
        let combined = RecordFilter::default().unit("A").responsible_party("B").apply(&records);

        assert_eq!(unit_then_party, party_then_unit);
        assert_eq!(unit_then_party, combined);
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].process_number, "1700160001");
    }

    #[test]
    fn process_number_is_case_insensitive_substring() {
        let records = sample();
        let hits = RecordFilter::default().process_number("AB").apply(&records);
        let numbers: Vec<&str> = hits.iter().map(|r| r.process_number.as_str()).collect();
        assert_eq!(numbers, vec!["17001AB99", "1700ab"]);
    }

    #[test]
    fn unit_match_is_exact() {
        let records = sample();
        assert!(RecordFilter::default().unit("a").apply(&records).is_empty());
    }

    #[test]
    fn missing_party_never_matches_a_party_filter() {
        let records = sample();
        let hits = RecordFilter::default().unit("A").responsible_party("C").apply(&records);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn deserializes_short_query_names() {
        let filter: RecordFilter =
            serde_json::from_str(r#"{"unit":"A","responsible":"B","process":"17"}"#).unwrap();
        assert_eq!(filter, RecordFilter::default().unit("A").responsible_party("B").process_number("17"));
    }

    #[test]
    fn options_are_sorted_and_distinct() {
        let records = sample();
        let options = FilterOptions::collect(&records);
        assert_eq!(options.units, vec!["A", "D"]);
        assert_eq!(options.responsible_parties, vec!["B", "C"]);
    }
}

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use custodia_core::{GroupKey, VehicleRecord, UNASSIGNED_LABEL};

use crate::labels::sheet_label;

/// Records destined for one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGroup<'a> {
    pub label: String,
    pub rows: Vec<&'a VehicleRecord>,
}

struct Bucket<'a> {
    group: SheetGroup<'a>,
    sources: BTreeSet<&'a str>,
}

/// Partition records by `key`, one group per distinct sheet label.
///
/// Worksheet names are unique case-insensitively, so labels are compared
/// case-folded; the first spelling seen is kept. Groups come back ordered by
/// that folded label and rows keep their input order. Distinct source values
/// that collapse onto the same label are merged and logged.
pub fn group_by<'a, I>(records: I, key: GroupKey) -> Vec<SheetGroup<'a>>
where
    I: IntoIterator<Item = &'a VehicleRecord>,
{
    let mut buckets: BTreeMap<String, Bucket<'a>> = BTreeMap::new();

    for record in records {
        let raw = record.key(key);
        let label = sheet_label(raw);
        let bucket = buckets.entry(label.to_lowercase()).or_insert_with(|| Bucket {
            group: SheetGroup {
                label,
                rows: Vec::new(),
            },
            sources: BTreeSet::new(),
        });
        bucket.sources.insert(raw.map(str::trim).unwrap_or(UNASSIGNED_LABEL));
        bucket.group.rows.push(record);
    }

    buckets
        .into_values()
        .map(|bucket| {
            if bucket.sources.len() > 1 {
                warn!(
                    sheet = %bucket.group.label,
                    sources = ?bucket.sources,
                    "distinct values share one sheet label; rows merged"
                );
            }
            bucket.group
        })
        .collect()
}

use custodia_core::{Field, RecordSet};

/// Columns of the emailed alert report, one sheet per responsible party.
pub const DEFAULT_ALERT_COLUMNS: [Field; 7] = [
    Field::OrganizationalUnit,
    Field::ParentUnit,
    Field::ResponsibleParty,
    Field::ProcessNumber,
    Field::AssetTag,
    Field::EntryDate,
    Field::CustodyDays,
];

/// Columns of the reporting view's alert table and its export.
pub const DASHBOARD_ALERT_COLUMNS: [Field; 8] = [
    Field::ProcessNumber,
    Field::AssetTag,
    Field::VehicleClass,
    Field::Plate,
    Field::EngineNumber,
    Field::Chassis,
    Field::EntryDate,
    Field::CustodyDays,
];

/// Keep the requested columns that the source actually provided, in order.
/// Duplicates are dropped; custody days is always available.
pub fn project(columns: &[Field], set: &RecordSet) -> Vec<Field> {
    let mut projected: Vec<Field> = Vec::with_capacity(columns.len());
    for &field in columns {
        if set.has_field(field) && !projected.contains(&field) {
            projected.push(field);
        }
    }
    projected
}

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Label used whenever a grouping key is missing or blank.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Every column the record model knows about.
///
/// All variants except [`Field::CustodyDays`] are read from the source file;
/// custody days is derived from the entry date at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    OrganizationalUnit,
    ParentUnit,
    ResponsibleParty,
    ProcessNumber,
    AssetTag,
    EntryDate,
    RegionalUnit,
    Plate,
    VehicleClass,
    EngineNumber,
    Chassis,
    Origin,
    UniqueCode,
    CustodyDays,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::OrganizationalUnit,
        Field::ParentUnit,
        Field::ResponsibleParty,
        Field::ProcessNumber,
        Field::AssetTag,
        Field::EntryDate,
        Field::RegionalUnit,
        Field::Plate,
        Field::VehicleClass,
        Field::EngineNumber,
        Field::Chassis,
        Field::Origin,
        Field::UniqueCode,
        Field::CustodyDays,
    ];

    /// Snake-case name, also used to build `COLUMN_<NAME>` config keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::OrganizationalUnit => "organizational_unit",
            Field::ParentUnit => "parent_unit",
            Field::ResponsibleParty => "responsible_party",
            Field::ProcessNumber => "process_number",
            Field::AssetTag => "asset_tag",
            Field::EntryDate => "entry_date",
            Field::RegionalUnit => "regional_unit",
            Field::Plate => "plate",
            Field::VehicleClass => "vehicle_class",
            Field::EngineNumber => "engine_number",
            Field::Chassis => "chassis",
            Field::Origin => "origin",
            Field::UniqueCode => "unique_code",
            Field::CustodyDays => "custody_days",
        }
    }

    /// Header used by the FGN custody exports.
    pub fn default_header(&self) -> &'static str {
        match self {
            Field::OrganizationalUnit => "SECCIONAL",
            Field::ParentUnit => "DEPENDENCIA PADRE",
            Field::ResponsibleParty => "NOMBRE RESPESPONSABLE",
            Field::ProcessNumber => "NRO PROCESO",
            Field::AssetTag => "PLACA SIAF",
            Field::EntryDate => "FECHA ENTRADA",
            Field::RegionalUnit => "REGIONALSECCIONAL",
            Field::Plate => "PLACA",
            Field::VehicleClass => "CLASE",
            Field::EngineNumber => "NUMERO MOTOR",
            Field::Chassis => "CHASIS",
            Field::Origin => "PROCEDENCIA",
            Field::UniqueCode => "CODIGO UNICO",
            Field::CustodyDays => "TIEMPO_CUSTODIA(DIAS)",
        }
    }

    /// Whether a load must fail when the column is missing from the header.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            Field::OrganizationalUnit
                | Field::ParentUnit
                | Field::ResponsibleParty
                | Field::ProcessNumber
                | Field::AssetTag
                | Field::EntryDate
        )
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, Field::CustodyDays)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys a record set can be partitioned by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    #[default]
    OrganizationalUnit,
    ParentUnit,
    RegionalUnit,
    ResponsibleParty,
    Origin,
}

impl GroupKey {
    pub fn field(&self) -> Field {
        match self {
            GroupKey::OrganizationalUnit => Field::OrganizationalUnit,
            GroupKey::ParentUnit => Field::ParentUnit,
            GroupKey::RegionalUnit => Field::RegionalUnit,
            GroupKey::ResponsibleParty => Field::ResponsibleParty,
            GroupKey::Origin => Field::Origin,
        }
    }
}

impl std::str::FromStr for GroupKey {
    type Err = String;

    /// Accepts the snake_case field names used in query strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "organizational_unit" | "unit" => Ok(GroupKey::OrganizationalUnit),
            "parent_unit" => Ok(GroupKey::ParentUnit),
            "regional_unit" => Ok(GroupKey::RegionalUnit),
            "responsible_party" | "responsible" => Ok(GroupKey::ResponsibleParty),
            "origin" => Ok(GroupKey::Origin),
            other => Err(format!("unknown grouping key '{other}'")),
        }
    }
}

/// A single cell value as seen by projections and exports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Date(NaiveDate),
    Integer(i64),
    Null,
}

impl<'a> FieldValue<'a> {
    /// Extract as string, returning None for anything but text.
    pub fn as_str(self) -> Option<&'a str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One row of the custody table.
///
/// `custody_days` is private: it can only be set through
/// [`VehicleRecord::with_entry_date`], which derives it from the entry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleRecord {
    pub organizational_unit: String,
    pub parent_unit: Option<String>,
    pub responsible_party: Option<String>,
    pub process_number: String,
    pub asset_tag: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub regional_unit: Option<String>,
    pub plate: Option<String>,
    pub vehicle_class: Option<String>,
    pub engine_number: Option<String>,
    pub chassis: Option<String>,
    pub origin: Option<String>,
    pub unique_code: Option<String>,
    custody_days: Option<i64>,
}

impl VehicleRecord {
    pub fn new(organizational_unit: impl Into<String>, process_number: impl Into<String>) -> Self {
        Self {
            organizational_unit: organizational_unit.into(),
            parent_unit: None,
            responsible_party: None,
            process_number: process_number.into(),
            asset_tag: None,
            entry_date: None,
            regional_unit: None,
            plate: None,
            vehicle_class: None,
            engine_number: None,
            chassis: None,
            origin: None,
            unique_code: None,
            custody_days: None,
        }
    }

    /// Set the entry date and derive custody days relative to `as_of`.
    pub fn with_entry_date(mut self, entry_date: Option<NaiveDate>, as_of: NaiveDate) -> Self {
        self.entry_date = entry_date;
        self.custody_days = entry_date.map(|d| (as_of - d).num_days());
        self
    }

    /// Set an optional text column. Blank values are stored as `None`;
    /// the two mandatory text columns fall back to an empty string.
    pub fn with_text(mut self, field: Field, value: Option<&str>) -> Self {
        let value = value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        match field {
            Field::OrganizationalUnit => self.organizational_unit = value.unwrap_or_default(),
            Field::ProcessNumber => self.process_number = value.unwrap_or_default(),
            Field::ParentUnit => self.parent_unit = value,
            Field::ResponsibleParty => self.responsible_party = value,
            Field::AssetTag => self.asset_tag = value,
            Field::RegionalUnit => self.regional_unit = value,
            Field::Plate => self.plate = value,
            Field::VehicleClass => self.vehicle_class = value,
            Field::EngineNumber => self.engine_number = value,
            Field::Chassis => self.chassis = value,
            Field::Origin => self.origin = value,
            Field::UniqueCode => self.unique_code = value,
            Field::EntryDate | Field::CustodyDays => {}
        }
        self
    }

    pub fn with_responsible_party(self, name: &str) -> Self {
        self.with_text(Field::ResponsibleParty, Some(name))
    }

    /// Days between entry and the as-of date; `None` when the entry date is unknown.
    pub fn custody_days(&self) -> Option<i64> {
        self.custody_days
    }

    pub fn value(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::OrganizationalUnit => FieldValue::Text(&self.organizational_unit),
            Field::ProcessNumber => FieldValue::Text(&self.process_number),
            Field::ParentUnit => text_value(&self.parent_unit),
            Field::ResponsibleParty => text_value(&self.responsible_party),
            Field::AssetTag => text_value(&self.asset_tag),
            Field::RegionalUnit => text_value(&self.regional_unit),
            Field::Plate => text_value(&self.plate),
            Field::VehicleClass => text_value(&self.vehicle_class),
            Field::EngineNumber => text_value(&self.engine_number),
            Field::Chassis => text_value(&self.chassis),
            Field::Origin => text_value(&self.origin),
            Field::UniqueCode => text_value(&self.unique_code),
            Field::EntryDate => self.entry_date.map_or(FieldValue::Null, FieldValue::Date),
            Field::CustodyDays => self.custody_days.map_or(FieldValue::Null, FieldValue::Integer),
        }
    }

    /// Raw grouping value, `None` when missing or blank.
    pub fn key(&self, key: GroupKey) -> Option<&str> {
        self.value(key.field()).as_str().filter(|s| !s.trim().is_empty())
    }

    /// Grouping value with the unassigned sentinel substituted.
    pub fn key_label(&self, key: GroupKey) -> &str {
        self.key(key).unwrap_or(UNASSIGNED_LABEL)
    }
}

fn text_value(value: &Option<String>) -> FieldValue<'_> {
    match value {
        Some(s) => FieldValue::Text(s),
        None => FieldValue::Null,
    }
}

/// A row whose entry date could not be parsed with any configured format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateParseWarning {
    /// 1-based line in the source file (the header is line 1).
    pub line: u64,
    /// Header of the date column as it appears in the source.
    pub header: String,
    pub raw: String,
}

impl std::fmt::Display for DateParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: unparseable {} '{}'", self.line, self.header, self.raw)
    }
}

/// An immutable, fully derived set of records from one load.
#[derive(Debug, Clone)]
pub struct RecordSet {
    records: Vec<VehicleRecord>,
    present: BTreeSet<Field>,
    warnings: Vec<DateParseWarning>,
    as_of: NaiveDate,
}

impl RecordSet {
    /// `present` lists the source columns found in the header; custody days
    /// is always added since it is derived.
    pub fn new(
        records: Vec<VehicleRecord>,
        present: BTreeSet<Field>,
        warnings: Vec<DateParseWarning>,
        as_of: NaiveDate,
    ) -> Self {
        let mut present = present;
        present.insert(Field::CustodyDays);
        Self {
            records,
            present,
            warnings,
            as_of,
        }
    }

    /// Record set with every column marked present and no warnings.
    pub fn from_records(records: Vec<VehicleRecord>, as_of: NaiveDate) -> Self {
        Self::new(records, Field::ALL.into_iter().collect(), Vec::new(), as_of)
    }

    pub fn records(&self) -> &[VehicleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.present.contains(&field)
    }

    pub fn warnings(&self) -> &[DateParseWarning] {
        &self.warnings
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn custody_days_derived_from_entry_date() {
        let record = VehicleRecord::new("Caldas", "170016000")
            .with_entry_date(Some(day(2024, 1, 1)), day(2024, 7, 19));
        assert_eq!(record.custody_days(), Some(200));
        assert_eq!(record.value(Field::CustodyDays), FieldValue::Integer(200));
    }

    #[test]
    fn unknown_entry_date_means_unknown_custody() {
        let record = VehicleRecord::new("Caldas", "1").with_entry_date(None, day(2024, 7, 19));
        assert_eq!(record.custody_days(), None);
        assert_eq!(record.value(Field::EntryDate), FieldValue::Null);
    }

    #[test]
    fn group_key_parses_query_names() {
        assert_eq!("unit".parse::<GroupKey>(), Ok(GroupKey::OrganizationalUnit));
        assert_eq!("responsible_party".parse::<GroupKey>(), Ok(GroupKey::ResponsibleParty));
        assert!("color".parse::<GroupKey>().is_err());
    }

    #[test]
    fn blank_text_is_stored_as_none() {
        let record = VehicleRecord::new("Caldas", "1").with_text(Field::ResponsibleParty, Some("   "));
        assert_eq!(record.responsible_party, None);
        assert_eq!(record.key_label(GroupKey::ResponsibleParty), UNASSIGNED_LABEL);
    }

    #[test]
    fn text_values_are_trimmed() {
        let record = VehicleRecord::new("Caldas", "1").with_text(Field::Plate, Some(" ABC123 "));
        assert_eq!(record.plate.as_deref(), Some("ABC123"));
    }

    #[test]
    fn required_fields_match_source_contract() {
        let required: Vec<Field> = Field::ALL.into_iter().filter(Field::is_required).collect();
        assert_eq!(
            required,
            vec![
                Field::OrganizationalUnit,
                Field::ParentUnit,
                Field::ResponsibleParty,
                Field::ProcessNumber,
                Field::AssetTag,
                Field::EntryDate,
            ]
        );
        assert!(!Field::CustodyDays.is_required());
    }

    #[test]
    fn record_set_always_has_custody_days() {
        let set = RecordSet::new(Vec::new(), BTreeSet::new(), Vec::new(), day(2024, 1, 1));
        assert!(set.has_field(Field::CustodyDays));
        assert!(!set.has_field(Field::Plate));
        assert!(set.is_empty());
    }

    #[test]
    fn serialized_record_carries_derived_custody_days() {
        let record = VehicleRecord::new("Caldas", "1")
            .with_entry_date(Some(day(2024, 1, 1)), day(2024, 7, 19));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["custody_days"], 200);
        assert_eq!(json["entry_date"], "2024-01-01");
    }

    #[test]
    fn group_key_deserializes_from_snake_case() {
        let key: GroupKey = serde_json::from_str("\"responsible_party\"").unwrap();
        assert_eq!(key, GroupKey::ResponsibleParty);
        assert_eq!(key.field(), Field::ResponsibleParty);
    }
}

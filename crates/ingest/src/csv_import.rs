use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ByteRecord, ReaderBuilder};
use tracing::{debug, info, warn};

use custodia_core::config::SourceConfig;
use custodia_core::{DateParseWarning, Field, RecordSet, SourceSchema, VehicleRecord};

use crate::dates::{parse_entry_date, DateCell};
use crate::error::DataLoadError;

/// Individual warnings logged before switching to a summary line.
const MAX_LOGGED_WARNINGS: usize = 5;

/// Column positions resolved once against the source header.
#[derive(Debug)]
struct ColumnLayout {
    positions: BTreeMap<Field, usize>,
}

impl ColumnLayout {
    fn resolve(schema: &SourceSchema, headers: &[String]) -> Result<Self, DataLoadError> {
        let mut positions = BTreeMap::new();
        let mut missing = Vec::new();

        for spec in schema.source_columns() {
            // Duplicate headers: the first occurrence wins.
            match headers.iter().position(|h| *h == spec.header) {
                Some(idx) => {
                    positions.insert(spec.field, idx);
                }
                None if spec.required => missing.push(spec.header.clone()),
                None => debug!(column = %spec.header, "optional column absent from source"),
            }
        }

        if !missing.is_empty() {
            return Err(DataLoadError::MissingColumns(missing));
        }

        for header in headers.iter().filter(|h| SourceSchema::is_stored_custody_header(h)) {
            debug!(column = %header, "ignoring stored custody column; custody days are recomputed");
        }

        Ok(Self { positions })
    }

    fn present(&self) -> BTreeSet<Field> {
        self.positions.keys().copied().collect()
    }

    fn cell(&self, record: &ByteRecord, field: Field) -> Option<String> {
        let idx = *self.positions.get(&field)?;
        record
            .get(idx)
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
    }
}

/// Reads the custody CSV into a validated, fully derived [`RecordSet`].
pub struct CsvImporter;

impl CsvImporter {
    pub fn import(
        path: &Path,
        config: &SourceConfig,
        as_of: NaiveDate,
    ) -> Result<RecordSet, DataLoadError> {
        let file = std::fs::File::open(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_reader(file, config, as_of)?;
        info!(
            path = %path.display(),
            records = set.len(),
            date_warnings = set.warnings().len(),
            as_of = %as_of,
            "custody records loaded"
        );
        Ok(set)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        config: &SourceConfig,
        as_of: NaiveDate,
    ) -> Result<RecordSet, DataLoadError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(config.delimiter)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .byte_headers()?
            .iter()
            .map(|h| {
                String::from_utf8_lossy(h)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_string()
            })
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(DataLoadError::EmptyHeader);
        }

        let layout = ColumnLayout::resolve(&config.schema, &headers)?;

        let mut records = Vec::new();
        let mut warnings = Vec::new();
        let mut record = ByteRecord::new();

        while rdr.read_byte_record(&mut record)? {
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let entry_date = match layout.cell(&record, Field::EntryDate) {
                Some(raw) => match parse_entry_date(&raw, &config.date_formats) {
                    DateCell::Parsed(date) => Some(date),
                    DateCell::Blank => None,
                    DateCell::Invalid => {
                        let warning = DateParseWarning {
                            line,
                            header: config.schema.header(Field::EntryDate).to_string(),
                            raw,
                        };
                        if warnings.len() < MAX_LOGGED_WARNINGS {
                            warn!(%warning, "entry date unparseable; custody unknown");
                        }
                        warnings.push(warning);
                        None
                    }
                },
                None => None,
            };

            let mut vehicle = VehicleRecord::new(String::new(), String::new())
                .with_entry_date(entry_date, as_of);
            for field in layout.positions.keys().copied() {
                if field == Field::EntryDate {
                    continue;
                }
                vehicle = vehicle.with_text(field, layout.cell(&record, field).as_deref());
            }
            records.push(vehicle);
        }

        if warnings.len() > MAX_LOGGED_WARNINGS {
            warn!(
                total = warnings.len(),
                "rows with unparseable entry dates excluded from alert classification"
            );
        }

        Ok(RecordSet::new(records, layout.present(), warnings, as_of))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "SECCIONAL,DEPENDENCIA PADRE,NOMBRE RESPESPONSABLE,NRO PROCESO,PLACA SIAF,FECHA ENTRADA";

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 19).unwrap()
    }

    fn load(csv: &str) -> Result<RecordSet, DataLoadError> {
        CsvImporter::from_reader(csv.as_bytes(), &SourceConfig::default(), as_of())
    }

    #[test]
    fn loads_required_columns() {
        let csv = format!("{HEADER}\nCaldas,Patio Unico,Smith,170016000123,SIAF-1,01/01/2024\n");
        let set = load(&csv).unwrap();
        assert_eq!(set.len(), 1);
        let r = &set.records()[0];
        assert_eq!(r.organizational_unit, "Caldas");
        assert_eq!(r.parent_unit.as_deref(), Some("Patio Unico"));
        assert_eq!(r.responsible_party.as_deref(), Some("Smith"));
        assert_eq!(r.process_number, "170016000123");
        assert_eq!(r.asset_tag.as_deref(), Some("SIAF-1"));
        assert_eq!(r.custody_days(), Some(200));
        assert!(set.has_field(Field::AssetTag));
        assert!(!set.has_field(Field::Plate));
    }

    #[test]
    fn missing_required_columns_are_all_reported() {
        let err = load("SECCIONAL,NRO PROCESO\nCaldas,1\n").unwrap_err();
        match err {
            DataLoadError::MissingColumns(cols) => {
                assert_eq!(
                    cols,
                    vec!["DEPENDENCIA PADRE", "NOMBRE RESPESPONSABLE", "PLACA SIAF", "FECHA ENTRADA"]
                );
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn header_whitespace_is_trimmed() {
        let csv = "SECCIONAL , DEPENDENCIA PADRE,NOMBRE RESPESPONSABLE,NRO PROCESO,PLACA SIAF,FECHA ENTRADA ,PROCEDENCIA \n\
                   Caldas,Patio,Smith,1,S1,01/01/2024,Juzgado\n";
        let set = load(csv).unwrap();
        assert_eq!(set.records()[0].origin.as_deref(), Some("Juzgado"));
        assert_eq!(set.records()[0].custody_days(), Some(200));
    }

    #[test]
    fn stored_custody_column_is_ignored() {
        let csv = format!("{HEADER},TIEMPO_CUSTODIA(DIAS)\nCaldas,Patio,Smith,1,S1,01/01/2024,9999\n");
        let set = load(&csv).unwrap();
        assert_eq!(set.records()[0].custody_days(), Some(200));
    }

    #[test]
    fn unparseable_date_becomes_unknown_with_warning() {
        let csv = format!(
            "{HEADER}\nCaldas,Patio,Smith,1,S1,31/02/2024\nCaldas,Patio,Smith,2,S2,\nCaldas,Patio,Smith,3,S3,01/01/2024\n"
        );
        let set = load(&csv).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.records()[0].custody_days(), None);
        assert_eq!(set.records()[1].custody_days(), None);
        assert_eq!(set.records()[2].custody_days(), Some(200));
        // Blank dates are unknown but not warned about.
        assert_eq!(set.warnings().len(), 1);
        assert_eq!(set.warnings()[0].line, 2);
        assert_eq!(set.warnings()[0].raw, "31/02/2024");
    }

    #[test]
    fn short_rows_are_tolerated() {
        let csv = format!("{HEADER}\nCaldas,Patio\n");
        let set = load(&csv).unwrap();
        let r = &set.records()[0];
        assert_eq!(r.organizational_unit, "Caldas");
        assert_eq!(r.responsible_party, None);
        assert_eq!(r.custody_days(), None);
    }

    #[test]
    fn configured_delimiter_and_headers() {
        let config = SourceConfig {
            delimiter: b';',
            schema: SourceSchema::default().with_header(Field::ResponsibleParty, "NOMBRE RESP"),
            ..SourceConfig::default()
        };
        let csv = "SECCIONAL;DEPENDENCIA PADRE;NOMBRE RESP;NRO PROCESO;PLACA SIAF;FECHA ENTRADA\n\
                   Caldas;Patio;Gómez;1;S1;01/01/2024\n";
        let set = CsvImporter::from_reader(csv.as_bytes(), &config, as_of()).unwrap();
        assert_eq!(set.records()[0].responsible_party.as_deref(), Some("Gómez"));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut bytes = format!("{HEADER}\n").into_bytes();
        bytes.extend_from_slice(b"Caldas,Patio,G\xf3mez,1,S1,01/01/2024\n");
        let set = CsvImporter::from_reader(bytes.as_slice(), &SourceConfig::default(), as_of()).unwrap();
        let name = set.records()[0].responsible_party.clone().unwrap();
        assert!(name.starts_with('G') && name.ends_with("mez"));
    }

    #[test]
    fn byte_order_mark_is_stripped() {
        let csv = format!("\u{feff}{HEADER}\nCaldas,Patio,Smith,1,S1,01/01/2024\n");
        let set = load(&csv).unwrap();
        assert_eq!(set.records()[0].organizational_unit, "Caldas");
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(load(""), Err(DataLoadError::EmptyHeader)));
    }

    #[test]
    fn import_missing_file_is_io_error() {
        let err = CsvImporter::import(
            Path::new("/definitely/not/here.csv"),
            &SourceConfig::default(),
            as_of(),
        )
        .unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use custodia_core::{Field, FieldValue, SourceSchema, VehicleRecord};

use crate::error::ReportError;
use crate::grouping::SheetGroup;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Sheet name used by the single-sheet export.
pub const EXPORT_SHEET_NAME: &str = "Alertas";

const DATE_FORMAT: &str = "%Y-%m-%d";
const COLUMN_WIDTH: f64 = 22.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub label: String,
    pub rows: usize,
}

/// A finished workbook held in memory.
#[derive(Debug, Clone)]
pub struct Report {
    pub bytes: Vec<u8>,
    pub sheets: Vec<SheetSummary>,
}

impl Report {
    pub fn row_count(&self) -> usize {
        self.sheets.iter().map(|s| s.rows).sum()
    }
}

/// One worksheet per group, in group order.
pub fn build_grouped(
    groups: &[SheetGroup<'_>],
    columns: &[Field],
    schema: &SourceSchema,
) -> Result<Report, ReportError> {
    if groups.is_empty() {
        return Err(ReportError::Empty);
    }

    let header = Format::new().set_bold();
    let mut workbook = Workbook::new();
    let mut sheets = Vec::with_capacity(groups.len());

    for group in groups {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&group.label)?;
        write_table(sheet, &group.rows, columns, schema, &header)?;
        sheets.push(SheetSummary {
            label: group.label.clone(),
            rows: group.rows.len(),
        });
    }

    let bytes = workbook.save_to_buffer()?;
    info!(sheets = sheets.len(), bytes = bytes.len(), "grouped workbook built");
    Ok(Report { bytes, sheets })
}

/// All rows on a single named worksheet.
pub fn build_single(
    name: &str,
    rows: &[&VehicleRecord],
    columns: &[Field],
    schema: &SourceSchema,
) -> Result<Report, ReportError> {
    if rows.is_empty() {
        return Err(ReportError::Empty);
    }

    let header = Format::new().set_bold();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    write_table(sheet, rows, columns, schema, &header)?;

    let bytes = workbook.save_to_buffer()?;
    Ok(Report {
        bytes,
        sheets: vec![SheetSummary {
            label: name.to_string(),
            rows: rows.len(),
        }],
    })
}

fn write_table(
    sheet: &mut Worksheet,
    rows: &[&VehicleRecord],
    columns: &[Field],
    schema: &SourceSchema,
    header: &Format,
) -> Result<(), ReportError> {
    for (col, field) in columns.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, schema.header(*field), header)?;
        sheet.set_column_width(col, COLUMN_WIDTH)?;
    }

    for (idx, record) in rows.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, field) in columns.iter().enumerate() {
            let col = col as u16;
            match record.value(*field) {
                FieldValue::Text(s) => {
                    sheet.write_string(row, col, s)?;
                }
                FieldValue::Date(d) => {
                    sheet.write_string(row, col, d.format(DATE_FORMAT).to_string())?;
                }
                FieldValue::Integer(n) => {
                    sheet.write_number(row, col, n as f64)?;
                }
                FieldValue::Null => {}
            }
        }
    }
    Ok(())
}

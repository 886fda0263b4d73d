//! Explicit column schema for the custody source file.
//!
//! Each [`Field`] maps to exactly one header name. Required columns must be
//! present in the source header; optional ones may be missing, in which case
//! their values are `None` for every row.

use serde::{Deserialize, Serialize};

use crate::record::Field;

/// Stored custody-day columns found in older exports. They are never read:
/// custody days are always recomputed from the entry date.
pub const STORED_CUSTODY_HEADERS: &[&str] = &["TIEMPO_CUSTODIA(DIAS)", "TIEMPO CUSTODIA(dias)"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub field: Field,
    pub header: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSchema {
    columns: Vec<ColumnSpec>,
}

impl Default for SourceSchema {
    fn default() -> Self {
        Self {
            columns: Field::ALL
                .into_iter()
                .map(|field| ColumnSpec {
                    field,
                    header: field.default_header().to_string(),
                    required: field.is_required(),
                })
                .collect(),
        }
    }
}

impl SourceSchema {
    /// Override the header name for one field. Surrounding whitespace is
    /// trimmed so it compares equal to trimmed source headers.
    pub fn with_header(mut self, field: Field, header: impl Into<String>) -> Self {
        let header = header.into().trim().to_string();
        if let Some(spec) = self.columns.iter_mut().find(|c| c.field == field) {
            spec.header = header;
        }
        self
    }

    pub fn header(&self, field: Field) -> &str {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.header.as_str())
            .unwrap_or_else(|| field.default_header())
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Columns read from the file (everything except derived ones).
    pub fn source_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| !c.field.is_derived())
    }

    pub fn is_stored_custody_header(header: &str) -> bool {
        STORED_CUSTODY_HEADERS.contains(&header)
    }
}

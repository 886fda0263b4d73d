//! Entry-date parsing against an explicit list of chrono formats.
//!
//! Formats are tried in configured order. Nothing is guessed: `03/04/2024`
//! is only ever read the way the configured pattern says.

use chrono::{NaiveDate, NaiveDateTime};

/// Outcome of reading one date cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCell {
    Blank,
    Parsed(NaiveDate),
    Invalid,
}

pub fn parse_entry_date(raw: &str, formats: &[String]) -> DateCell {
    let value = raw.trim();
    if value.is_empty() {
        return DateCell::Blank;
    }

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return DateCell::Parsed(date);
        }
        // Datetime patterns carry a time part NaiveDate rejects.
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return DateCell::Parsed(datetime.date());
        }
    }

    DateCell::Invalid
}

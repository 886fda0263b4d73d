use custodia_core::UNASSIGNED_LABEL;

/// Longest label kept, in characters. Excel caps sheet names at 31.
pub const MAX_LABEL_CHARS: usize = 30;

const FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Turn a raw grouping value into a valid worksheet name.
///
/// Missing or blank values map to [`UNASSIGNED_LABEL`].
pub fn sheet_label(raw: Option<&str>) -> String {
    let raw = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return UNASSIGNED_LABEL.to_string(),
    };

    let cleaned: String = raw
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) || c.is_control() { '_' } else { c })
        .take(MAX_LABEL_CHARS)
        .collect();

    let cleaned = cleaned.trim_matches('\'');
    if cleaned.is_empty() {
        UNASSIGNED_LABEL.to_string()
    } else {
        cleaned.to_string()
    }
}

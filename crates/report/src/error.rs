/// Errors raised while building a spreadsheet report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("xlsx writer failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("no rows to report")]
    Empty,
}

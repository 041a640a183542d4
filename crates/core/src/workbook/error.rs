//! Workbook error types.

use thiserror::Error;

/// Workbook writing errors.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// The spreadsheet library rejected an operation.
    #[error("spreadsheet error: {0}")]
    Xlsx(String),

    /// An image could not be embedded.
    #[error("failed to embed image {path}: {message}")]
    Image {
        /// Image path.
        path: String,
        /// Underlying failure.
        message: String,
    },
}

impl From<rust_xlsxwriter::XlsxError> for WorkbookError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx(err.to_string())
    }
}

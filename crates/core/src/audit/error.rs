//! Audit error types.

use std::path::Path;

use thiserror::Error;

use crate::storage::StorageError;
use crate::workbook::WorkbookError;

/// Audit generation errors.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),

    /// Nothing was submitted in the month.
    #[error("No customs submitted within month {0}")]
    NoDeclarations(String),

    /// The audit row of a declaration could not be read.
    #[error("Query customs :{customs_id} audit info failed, error:{message}")]
    RowFailed {
        /// Declaration id.
        customs_id: String,
        /// Underlying failure.
        message: String,
    },

    /// A stored screenshot was referenced but no object storage is configured.
    #[error("customs {0} has a stored screenshot but object storage is not configured")]
    StorageUnavailable(String),

    /// File system operation failed.
    #[error("file system error at {path}: {message}")]
    Io {
        /// Path involved.
        path: String,
        /// Underlying failure.
        message: String,
    },

    /// Workbook writing failed.
    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    /// Screenshot download failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuditError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a row failure.
    #[must_use]
    pub fn row_failed(customs_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RowFailed {
            customs_id: customs_id.into(),
            message: message.into(),
        }
    }

    /// Create a file system error.
    #[must_use]
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

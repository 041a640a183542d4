//! ICP error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::workbook::WorkbookError;

/// ICP generation errors.
#[derive(Debug, Error)]
pub enum IcpError {
    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),

    /// Every tax query in the fallback chain came back empty or failed.
    #[error("The customs_id:{0} query tax info failed")]
    TaxUnresolved(String),

    /// A lookup that feeds the row assembler returned nothing.
    #[error("The customs_id:{customs_id} has no {what}")]
    MissingRecord {
        /// What was looked up.
        what: &'static str,
        /// Declaration the lookup was for.
        customs_id: String,
    },

    /// A lookup that feeds the row assembler failed.
    #[error("The customs_id:{customs_id} query {what} failed: {message}")]
    LookupFailed {
        /// What was looked up.
        what: &'static str,
        /// Declaration the lookup was for.
        customs_id: String,
        /// Underlying failure.
        message: String,
    },

    /// No eligible declarations for the requested scope.
    #[error("No customs found for {0}")]
    NoDeclarations(String),

    /// No duty party filed tax in the month.
    #[error("No duty party found for month {0}")]
    NoDutyParties(String),

    /// Supplied ICP file name does not carry a duty party and month.
    #[error("The ICP filename:{0} invalid format(correct: BE0796544895_200601_02150405.xlsx)")]
    InvalidFileName(String),

    /// File system operation failed.
    #[error("file system error at {path}: {message}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying failure.
        message: String,
    },

    /// Workbook writing failed.
    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    /// VAT-note archive failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl IcpError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a missing record error.
    #[must_use]
    pub fn missing(what: &'static str, customs_id: impl Into<String>) -> Self {
        Self::MissingRecord {
            what,
            customs_id: customs_id.into(),
        }
    }

    /// Create a lookup failure error.
    #[must_use]
    pub fn lookup(what: &'static str, customs_id: impl Into<String>, err: &Self) -> Self {
        Self::LookupFailed {
            what,
            customs_id: customs_id.into(),
            message: err.to_string(),
        }
    }

    /// Create a file system error.
    #[must_use]
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// A stage result that carries the errors accumulated while producing it.
///
/// Stages never abort on per-item failures; the orchestrator concatenates the errors of
/// every stage into the run's error list.
#[derive(Debug)]
pub struct Collected<T> {
    /// Produced value.
    pub value: T,
    /// Errors accumulated along the way.
    pub errors: Vec<IcpError>,
}

impl<T> Collected<T> {
    /// A value with no errors.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    /// Moves the errors into `sink` and returns the value.
    pub fn drain_into(self, sink: &mut Vec<IcpError>) -> T {
        sink.extend(self.errors);
        self.value
    }
}

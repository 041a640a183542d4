//! Storage error types.

use std::path::Path;

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Writing the downloaded object locally failed.
    #[error("failed to write {path}: {message}")]
    LocalWrite {
        /// Destination path.
        path: String,
        /// Underlying I/O error.
        message: String,
    },
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create a local write error.
    #[must_use]
    pub fn local_write(path: &Path, err: &std::io::Error) -> Self {
        Self::LocalWrite {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            _ => Self::Operation(err.to_string()),
        }
    }
}

//! Archive error types.

use std::path::Path;

use thiserror::Error;

/// Archive and download errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// File system operation failed.
    #[error("file system error at {path}: {message}")]
    Io {
        /// Path involved.
        path: String,
        /// Underlying failure.
        message: String,
    },

    /// Writing the zip failed.
    #[error("zip error: {0}")]
    Zip(String),

    /// Walking the source directory failed.
    #[error("directory walk error: {0}")]
    Walk(String),

    /// An HTTP download failed.
    #[error("download of {url} failed: {message}")]
    Download {
        /// Requested URL.
        url: String,
        /// Underlying failure.
        message: String,
    },
}

impl ArchiveError {
    /// Create a file system error.
    #[must_use]
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Create a download error.
    #[must_use]
    pub fn download(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Download {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Zip(err.to_string())
    }
}

impl From<walkdir::Error> for ArchiveError {
    fn from(err: walkdir::Error) -> Self {
        Self::Walk(err.to_string())
    }
}

//! Repository error type.

use icp_core::audit::AuditError;
use icp_core::icp::IcpError;
use sea_orm::DbErr;

/// Error types for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A column held a value the row type cannot represent.
    #[error("Invalid {column}: {value}")]
    InvalidValue {
        /// Column name.
        column: &'static str,
        /// Offending value.
        value: String,
    },
}

impl From<RepositoryError> for IcpError {
    fn from(err: RepositoryError) -> Self {
        Self::repository(err.to_string())
    }
}

impl From<RepositoryError> for AuditError {
    fn from(err: RepositoryError) -> Self {
        Self::repository(err.to_string())
    }
}

//! Database layer: MySQL repositories behind the core traits.
//!
//! This crate provides:
//! - The connection pool
//! - Raw statements for the customs schema
//! - Repository implementations for declarations, generations, audit rows and VAT history

pub mod repositories;
mod sql;

pub use repositories::{
    AuditRecordRepository, DeclarationStore, GenerationStore, RepositoryError,
    VatHistoryRepository,
};

use std::time::Duration;

use icp_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .max_lifetime(Duration::from_secs(180))
        .sqlx_logging(false);
    Database::connect(options).await
}

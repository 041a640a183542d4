//! Repository implementations for the core traits.
//!
//! Each repository wraps a `DatabaseConnection` and runs the raw statements in `sql`,
//! decoding rows with `FromQueryResult` structs.

mod audit;
mod declaration;
mod error;
mod generation;
mod query;
mod vat;

pub use audit::AuditRecordRepository;
pub use declaration::DeclarationStore;
pub use error::RepositoryError;
pub use generation::GenerationStore;
pub use vat::VatHistoryRepository;

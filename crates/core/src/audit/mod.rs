//! Monthly audit workbook.
//!
//! One row per declaration submitted in the month, with the price screenshot embedded when
//! it is held in object storage.

mod error;
mod repository;
mod service;
mod types;

pub use error::AuditError;
pub use repository::AuditRepository;
pub use service::{AuditReport, AuditService, AuditSettings};
pub use types::{AuditRecord, Screenshot};

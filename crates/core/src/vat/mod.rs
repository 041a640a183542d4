//! ICP files scoped by importer VAT number.
//!
//! Covers every declaration ever filed with the VAT number as importer, read from the
//! historical tax schema with one wide query per declaration and no fallback chain.

mod repository;
mod service;

pub use repository::{HistoricalRow, VatRepository};
pub use service::VatService;

//! ICP generation.
//!
//! This module implements the ICP filing pipeline:
//! - Tax line resolution with TAX → TMP_TAX and EU → non-EU fallback
//! - Row assembly joining base, importer, delivery, and company records
//! - Output file naming and parsing
//! - Generation metadata with per-period "newest" supersession
//! - Batch orchestration for one duty party and month, or an append to a named file
//!
//! # Pipeline
//!
//! ```text
//! customs ids ──► TaxResolver ──► DeclarationAssembler ──► IcpWorkbook ──► GenerationLedger
//!                 (split? EU? TAX?)   (rows, receipt, POD)    (3 sheets)      (service_icp*)
//! ```

mod assembler;
mod error;
mod filename;
mod generation;
mod repository;
mod resolver;
mod service;
mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use assembler::{AssembledDeclaration, DeclarationAssembler, ReceiptLinks, combine_rows};
pub(crate) use assembler::pods_for;
pub use error::{Collected, IcpError};
pub use filename::{IcpFileName, audit_file_name, vat_note_archive_name};
pub use generation::{
    GenerationLedger, GenerationMembership, GenerationRecord, NewGeneration, PeriodKey,
};
pub use repository::{DeclarationRepository, GenerationRepository};
pub use resolver::{ResolvedTax, TaxResolver, sort_lines};
pub use service::{IcpReport, IcpRequest, IcpService, IcpSettings};
pub(crate) use service::write_workbook;
pub use types::{
    BaseInfo, DECLARATION_ONLY, DeclarationKind, Delivery, Importer, PodFileObject, PodQuery,
    ProcessCode, TaxFileObject, TaxLine, TaxObject, TaxQuery,
};

//! Core generation logic for customs compliance workbooks.
//!
//! This crate contains the generation pipeline with ZERO web or database dependencies.
//! Data access goes through repository traits implemented by the db crate.
//!
//! # Modules
//!
//! - `icp` - Tax fallback resolution, row assembly, and ICP batch orchestration
//! - `vat` - ICP generation scoped to a VAT registration number
//! - `audit` - Monthly audit workbook with embedded price screenshots
//! - `workbook` - Fixed-layout spreadsheet sheets
//! - `archive` - VAT-note downloads and zip packaging
//! - `storage` - Object storage access (OSS, local filesystem)

pub mod archive;
pub mod audit;
pub mod icp;
pub mod storage;
pub mod vat;
pub mod workbook;

//! Spreadsheet output.
//!
//! - ICP workbook: tax line detail, tax receipt links, proof-of-delivery links
//! - Audit workbook: one sheet, price screenshots embedded per row
//!
//! Column layouts are fixed and order-significant.

mod audit;
mod error;
mod icp;

pub use audit::{AUDIT_HEADERS, AuditWorkbook};
pub use error::WorkbookError;
pub use icp::{ICP_HEADERS, IcpWorkbook, POD_HEADERS, TAX_FILE_HEADERS};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::Worksheet;

/// Decimal places kept for amounts and weights.
pub const AMOUNT_SCALE: u32 = 6;

/// Number format matching [`AMOUNT_SCALE`].
pub const AMOUNT_FORMAT: &str = "0.000000";

/// Cell value for a decimal amount, rounded to [`AMOUNT_SCALE`] places.
#[must_use]
pub fn amount_cell(value: Decimal) -> f64 {
    value.round_dp(AMOUNT_SCALE).to_f64().unwrap_or_default()
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str]) -> Result<(), WorkbookError> {
    for (col, header) in (0u16..).zip(headers) {
        sheet.write_string(0, col, *header)?;
    }
    Ok(())
}

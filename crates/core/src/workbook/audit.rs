//! The single-sheet audit workbook.

use std::path::Path;

use rust_xlsxwriter::{Image, Workbook, Worksheet};

use super::{WorkbookError, write_headers};
use crate::audit::{AuditRecord, Screenshot};

/// Audit sheet columns.
pub const AUDIT_HEADERS: [&str; 11] = [
    "Bill NO.",
    "Invoice No.",
    "Invoice Date",
    "Itemnr",
    "Statistical Number",
    "Duty(%)",
    "Product No.",
    "Link",
    "Description",
    "MRN",
    "Screenshot",
];

const SCREENSHOT_COL: u16 = 10;
const SCREENSHOT_ROW_HEIGHT: f64 = 200.0;

/// Audit sheet built row by row, so screenshots can be embedded as they arrive.
pub struct AuditWorkbook {
    sheet: Worksheet,
    next_row: u32,
}

impl AuditWorkbook {
    /// Start a sheet with the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new() -> Result<Self, WorkbookError> {
        let mut sheet = Worksheet::new();
        write_headers(&mut sheet, &AUDIT_HEADERS)?;
        Ok(Self { sheet, next_row: 1 })
    }

    /// Append a record and return its row index. URL screenshots are written as text.
    ///
    /// # Errors
    ///
    /// Returns an error if a cell cannot be written.
    pub fn push(&mut self, record: &AuditRecord) -> Result<u32, WorkbookError> {
        let row = self.next_row;
        let rate = record.duty_rate();
        let cells: [&str; 10] = [
            &record.bill_no,
            &record.customs_id,
            &record.invoice_date,
            &record.item_number,
            &record.hs_code,
            &rate,
            &record.product_no,
            &record.web_link,
            &record.description,
            &record.mrn,
        ];
        for (col, value) in (0u16..).zip(cells) {
            self.sheet.write_string(row, col, value)?;
        }
        if let Screenshot::Url(link) = record.screenshot() {
            self.sheet.write_string(row, SCREENSHOT_COL, link)?;
        }

        self.next_row += 1;
        Ok(row)
    }

    /// Embed an image in the screenshot column of `row`, growing the row to fit.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded or placed.
    pub fn embed_screenshot(&mut self, row: u32, path: &Path) -> Result<(), WorkbookError> {
        let image = Image::new(path).map_err(|e| WorkbookError::Image {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.sheet.set_row_height(row, SCREENSHOT_ROW_HEIGHT)?;
        self.sheet
            .insert_image_fit_to_cell(row, SCREENSHOT_COL, &image, true)?;
        Ok(())
    }

    /// Number of data rows written.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.next_row - 1) as usize
    }

    /// Whether no data rows were written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next_row == 1
    }

    /// Write the workbook to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be saved.
    pub fn save(self, path: &Path) -> Result<(), WorkbookError> {
        let mut workbook = Workbook::new();
        workbook.push_worksheet(self.sheet);
        workbook.save(path)?;
        Ok(())
    }
}

//! The three-sheet ICP workbook.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use super::{AMOUNT_FORMAT, WorkbookError, amount_cell, write_headers};
use crate::icp::{IcpFileName, PodFileObject, TaxFileObject, TaxObject};

/// Tax line detail columns.
pub const ICP_HEADERS: [&str; 34] = [
    "SN",
    "BIll NO.",
    "Tax Type",
    "Itemnr",
    "Destined Number",
    "Processing Status",
    "Invoice Number",
    "Invoice Date",
    "Xml Id",
    "Currency Code",
    "LocalCurrency Value",
    "Import Duty",
    "Dutch Costs",
    "Ductch VAT",
    "Statistical Number",
    "Weight(KG)",
    "No. of Pieces",
    "Country Pre fix",
    "VAT Registration Number",
    "Partner Name",
    "Country of Destination",
    "VAT Number",
    "EORI Number",
    "Importer SS Code",
    "Address Code",
    "Address",
    "Postcode",
    "City",
    "Product No",
    "Description",
    "MRN",
    "Company Name",
    "Mode",
    "ICP/115",
];

/// Tax receipt columns.
pub const TAX_FILE_HEADERS: [&str; 3] = ["SN", "MRN", "Tax receipt Link"];

/// Proof-of-delivery columns. `Invoice` is left for manual entry.
pub const POD_HEADERS: [&str; 7] = [
    "SN",
    "Bill No.",
    "Customs ID",
    "MRN No.",
    "Tracing No.",
    "POD Link",
    "Invoice",
];

/// Rows of one ICP file, written as `ICP_*`, `TAX_*` and `POD_*` sheets.
pub struct IcpWorkbook<'a> {
    name: &'a IcpFileName,
    rows: &'a [TaxObject],
    tax_files: &'a [TaxFileObject],
    pods: &'a [PodFileObject],
}

impl<'a> IcpWorkbook<'a> {
    /// Bundle the sheet contents.
    #[must_use]
    pub fn new(
        name: &'a IcpFileName,
        rows: &'a [TaxObject],
        tax_files: &'a [TaxFileObject],
        pods: &'a [PodFileObject],
    ) -> Self {
        Self {
            name,
            rows,
            tax_files,
            pods,
        }
    }

    /// Write the workbook to `path`. The parent directory must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a cell cannot be written or the file cannot be saved.
    pub fn save(&self, path: &Path) -> Result<(), WorkbookError> {
        let mut workbook = Workbook::new();
        workbook.push_worksheet(self.tax_sheet()?);
        workbook.push_worksheet(self.tax_file_sheet()?);
        workbook.push_worksheet(self.pod_sheet()?);
        workbook.save(path)?;

        info!(
            path = %path.display(),
            rows = self.rows.len(),
            receipts = self.tax_files.len(),
            pods = self.pods.len(),
            "Saved ICP workbook"
        );
        Ok(())
    }

    fn tax_sheet(&self) -> Result<Worksheet, WorkbookError> {
        let mut sheet = Worksheet::new();
        sheet.set_name(self.name.sheet_name("ICP"))?;
        write_headers(&mut sheet, &ICP_HEADERS)?;
        let amount = Format::new().set_num_format(AMOUNT_FORMAT);

        for (row, datum) in (1u32..).zip(self.rows) {
            sheet.write_number(row, 0, row)?;
            for (col, value) in text_cells(datum) {
                sheet.write_string(row, col, value)?;
            }
            sheet.write_number_with_format(
                row,
                10,
                amount_cell(datum.local_currency_value),
                &amount,
            )?;
            sheet.write_number_with_format(row, 11, amount_cell(datum.import_duty), &amount)?;
            sheet.write_number_with_format(row, 15, amount_cell(datum.net_weight), &amount)?;
            #[allow(clippy::cast_precision_loss)]
            let pieces = datum.quantity as f64;
            sheet.write_number(row, 16, pieces)?;
        }
        Ok(sheet)
    }

    fn tax_file_sheet(&self) -> Result<Worksheet, WorkbookError> {
        let mut sheet = Worksheet::new();
        sheet.set_name(self.name.sheet_name("TAX"))?;
        write_headers(&mut sheet, &TAX_FILE_HEADERS)?;

        for (row, datum) in (1u32..).zip(self.tax_files) {
            sheet.write_number(row, 0, row)?;
            sheet.write_string(row, 1, &datum.mrn)?;
            sheet.write_string(row, 2, &datum.link)?;
        }
        Ok(sheet)
    }

    fn pod_sheet(&self) -> Result<Worksheet, WorkbookError> {
        let mut sheet = Worksheet::new();
        sheet.set_name(self.name.sheet_name("POD"))?;
        write_headers(&mut sheet, &POD_HEADERS)?;

        for (row, datum) in (1u32..).zip(self.pods) {
            sheet.write_number(row, 0, row)?;
            sheet.write_string(row, 1, &datum.bill_no)?;
            sheet.write_string(row, 2, &datum.customs_id)?;
            sheet.write_string(row, 3, &datum.mrn)?;
            sheet.write_string(row, 4, &datum.tracking_no)?;
            sheet.write_string(row, 5, datum.pod_link.as_deref().unwrap_or_default())?;
        }
        Ok(sheet)
    }
}

/// Text columns of a tax row; SN and the numeric columns (K, L, P, Q) are written separately.
fn text_cells(datum: &TaxObject) -> [(u16, &str); 29] {
    [
        (1, &datum.bill_no),
        (2, &datum.tax_type),
        (3, &datum.item_number),
        (4, &datum.destined),
        (5, &datum.process_code),
        (6, &datum.customs_id),
        (7, &datum.invoice_date),
        (8, ""),
        (9, &datum.currency),
        (12, &datum.dutch_cost),
        (13, &datum.dutch_vat),
        (14, &datum.hs_code),
        (17, &datum.country_prefix),
        (18, &datum.duty_party),
        (19, &datum.partner_name),
        (20, &datum.country_of_destination),
        (21, &datum.vat_no),
        (22, &datum.eori_no),
        (23, &datum.importer_address_code),
        (24, &datum.address_code),
        (25, &datum.address_detail),
        (26, &datum.postal_code),
        (27, &datum.city),
        (28, &datum.product_no),
        (29, &datum.description),
        (30, &datum.mrn),
        (31, &datum.company_name),
        (32, &datum.mode),
        (33, &datum.in_icp_files),
    ]
}

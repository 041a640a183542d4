//! VAT history repository trait.

use std::future::Future;

use crate::icp::{IcpError, TaxObject};

/// A pre-joined row of the historical schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoricalRow {
    /// The sheet row.
    pub row: TaxObject,
    /// Processing status the tax was selected with.
    pub processing_status: u32,
}

/// Read access to the historical schema.
pub trait VatRepository: Send + Sync {
    /// Declarations filed with `vat_no` as importer: declare version 1, status NORMAL, MRN set.
    fn customs_ids_for_vat(
        &self,
        vat_no: &str,
    ) -> impl Future<Output = Result<Vec<String>, IcpError>> + Send;

    /// Every sheet row of a declaration, ordered by item number then tax type.
    fn historical_rows(
        &self,
        customs_id: &str,
    ) -> impl Future<Output = Result<Vec<HistoricalRow>, IcpError>> + Send;
}

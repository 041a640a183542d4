//! Repository traits for ICP data access.
//!
//! These traits are implemented by the db crate to provide actual database operations.

use std::future::Future;

use icp_shared::ReportMonth;

use super::error::IcpError;
use super::generation::{GenerationMembership, GenerationRecord, PeriodKey};
use super::types::{
    BaseInfo, DeclarationKind, Delivery, Importer, PodFileObject, PodQuery, ProcessCode, TaxLine,
    TaxQuery,
};

/// Read access to customs declarations.
pub trait DeclarationRepository: Send + Sync {
    /// Duty parties that filed TAX or TMP_TAX in the month.
    fn duty_parties_for_month(
        &self,
        month: ReportMonth,
    ) -> impl Future<Output = Result<Vec<String>, IcpError>> + Send;

    /// Master declarations of a duty party with tax filed in the month.
    fn eligible_customs_ids(
        &self,
        duty_party: &str,
        month: ReportMonth,
    ) -> impl Future<Output = Result<Vec<String>, IcpError>> + Send;

    /// Whether the declaration is the master of a split filing.
    fn declaration_kind(
        &self,
        customs_id: &str,
    ) -> impl Future<Output = Result<DeclarationKind, IcpError>> + Send;

    /// Tax lines for one query variant and process code, in database order.
    fn tax_lines(
        &self,
        query: TaxQuery,
        customs_id: &str,
        code: ProcessCode,
    ) -> impl Future<Output = Result<Vec<TaxLine>, IcpError>> + Send;

    /// Base customs information.
    fn base_info(
        &self,
        customs_id: &str,
    ) -> impl Future<Output = Result<Option<BaseInfo>, IcpError>> + Send;

    /// Importer address.
    fn importer(
        &self,
        customs_id: &str,
    ) -> impl Future<Output = Result<Option<Importer>, IcpError>> + Send;

    /// Delivery address.
    fn delivery(
        &self,
        customs_id: &str,
    ) -> impl Future<Output = Result<Option<Delivery>, IcpError>> + Send;

    /// Company that submitted the declaration.
    fn company_name(
        &self,
        customs_id: &str,
    ) -> impl Future<Output = Result<Option<String>, IcpError>> + Send;

    /// Number of `INSPECTION_FINE` log entries.
    fn inspection_fine_count(
        &self,
        customs_id: &str,
    ) -> impl Future<Output = Result<u64, IcpError>> + Send;

    /// Comma-joined names of generated files that already contain the declaration.
    fn icp_names_containing(
        &self,
        customs_id: &str,
    ) -> impl Future<Output = Result<Option<String>, IcpError>> + Send;

    /// Service key of the declaration's reference.
    fn service_key(
        &self,
        customs_id: &str,
    ) -> impl Future<Output = Result<Option<String>, IcpError>> + Send;

    /// Tracking rows with their POD links.
    fn pod_records(
        &self,
        customs_id: &str,
        query: PodQuery,
    ) -> impl Future<Output = Result<Vec<PodFileObject>, IcpError>> + Send;

    /// Whether the duty party's tax agency wants VAT notes archived.
    fn needs_vat_note(
        &self,
        duty_party: &str,
    ) -> impl Future<Output = Result<bool, IcpError>> + Send;
}

/// Persistence of generation metadata (`service_icp`, `service_icp_customs`).
pub trait GenerationRepository: Send + Sync {
    /// Number of records for the period.
    fn count_for_period(
        &self,
        key: &PeriodKey,
    ) -> impl Future<Output = Result<u64, IcpError>> + Send;

    /// Sets `is_newest = false` on every record of the period.
    fn clear_newest(&self, key: &PeriodKey)
    -> impl Future<Output = Result<u64, IcpError>> + Send;

    /// Inserts a generation record.
    fn insert_record(
        &self,
        record: &GenerationRecord,
    ) -> impl Future<Output = Result<(), IcpError>> + Send;

    /// Inserts membership rows, one statement each.
    fn insert_memberships(
        &self,
        memberships: &[GenerationMembership],
    ) -> impl Future<Output = Result<(), IcpError>> + Send;
}

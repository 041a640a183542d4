//! Audit repository trait.

use std::future::Future;

use icp_shared::ReportMonth;

use super::error::AuditError;
use super::types::AuditRecord;

/// Read access for the audit report.
pub trait AuditRepository: Send + Sync {
    /// Declarations that reached `SUBMITTED` in the month.
    fn submitted_customs_ids(
        &self,
        month: ReportMonth,
    ) -> impl Future<Output = Result<Vec<String>, AuditError>> + Send;

    /// First article of a declaration, joined with its bill and value process.
    fn audit_record(
        &self,
        customs_id: &str,
    ) -> impl Future<Output = Result<Option<AuditRecord>, AuditError>> + Send;
}

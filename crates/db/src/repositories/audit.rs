//! Audit rows.

use icp_core::audit::{AuditError, AuditRecord, AuditRepository};
use icp_shared::ReportMonth;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, FromQueryResult};
use std::sync::Arc;

use super::error::RepositoryError;
use super::query::{TextRow, statement, texts};
use crate::sql;

#[derive(Debug, FromQueryResult)]
struct AuditRow {
    bill_no: Option<String>,
    customs_id: Option<String>,
    mrn: Option<String>,
    item_number: Option<String>,
    hs_code: Option<String>,
    duty_rate_override: Option<Decimal>,
    duty_amount: Option<Decimal>,
    declared_value: Option<Decimal>,
    product_no: Option<String>,
    web_link: Option<String>,
    description: Option<String>,
    price_screenshot: Option<String>,
}

impl From<AuditRow> for AuditRecord {
    fn from(row: AuditRow) -> Self {
        Self {
            bill_no: row.bill_no.unwrap_or_default(),
            customs_id: row.customs_id.unwrap_or_default(),
            invoice_date: String::new(),
            mrn: row.mrn.unwrap_or_default(),
            item_number: row.item_number.unwrap_or_default(),
            hs_code: row.hs_code.unwrap_or_default(),
            duty_rate_override: row.duty_rate_override,
            duty_amount: row.duty_amount.unwrap_or_default(),
            declared_value: row.declared_value.unwrap_or_default(),
            product_no: row.product_no.unwrap_or_default(),
            web_link: row.web_link.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            price_screenshot: row.price_screenshot,
        }
    }
}

/// Audit repository.
#[derive(Debug, Clone)]
pub struct AuditRecordRepository {
    db: Arc<DatabaseConnection>,
}

impl AuditRecordRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl AuditRepository for AuditRecordRepository {
    async fn submitted_customs_ids(&self, month: ReportMonth) -> Result<Vec<String>, AuditError> {
        let rows = TextRow::find_by_statement(statement(
            sql::SUBMITTED_CUSTOMS_IDS,
            [month.to_string().into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(RepositoryError::from)?;
        Ok(texts(rows))
    }

    async fn audit_record(&self, customs_id: &str) -> Result<Option<AuditRecord>, AuditError> {
        let row = AuditRow::find_by_statement(statement(sql::AUDIT_RECORD, [customs_id.into()]))
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::from)?;
        Ok(row.map(AuditRecord::from))
    }
}

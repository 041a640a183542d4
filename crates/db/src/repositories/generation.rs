//! Generation records (`service_icp`) and their memberships (`service_icp_customs`).

use icp_core::icp::{
    GenerationMembership, GenerationRecord, GenerationRepository, IcpError, PeriodKey,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult, Value};
use std::sync::Arc;

use super::error::RepositoryError;
use super::query::{CountRow, statement};
use crate::sql;

/// Generation ledger repository.
#[derive(Debug, Clone)]
pub struct GenerationStore {
    db: Arc<DatabaseConnection>,
}

impl GenerationStore {
    /// Creates a new generation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn period_values(key: &PeriodKey) -> [Value; 3] {
    [
        key.duty_party.as_str().into(),
        key.year.into(),
        key.month.into(),
    ]
}

impl GenerationRepository for GenerationStore {
    async fn count_for_period(&self, key: &PeriodKey) -> Result<u64, IcpError> {
        let row = CountRow::find_by_statement(statement(sql::COUNT_FOR_PERIOD, period_values(key)))
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::from)?;
        Ok(u64::try_from(CountRow::get(row)).unwrap_or(0))
    }

    async fn clear_newest(&self, key: &PeriodKey) -> Result<u64, IcpError> {
        let result = self
            .db
            .execute(statement(sql::CLEAR_NEWEST, period_values(key)))
            .await
            .map_err(RepositoryError::from)?;
        Ok(result.rows_affected())
    }

    async fn insert_record(&self, record: &GenerationRecord) -> Result<(), IcpError> {
        self.db
            .execute(statement(
                sql::INSERT_GENERATION,
                [
                    record.duty_party.as_str().into(),
                    record.name.as_str().into(),
                    record.year.into(),
                    record.month.into(),
                    record.generated_at.into(),
                    record.total.into(),
                    record.status.into(),
                    record.vat_note.as_str().into(),
                    record.is_newest.into(),
                ],
            ))
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn insert_memberships(
        &self,
        memberships: &[GenerationMembership],
    ) -> Result<(), IcpError> {
        for membership in memberships {
            self.db
                .execute(statement(
                    sql::INSERT_MEMBERSHIP,
                    [
                        membership.icp_name.as_str().into(),
                        membership.customs_id.as_str().into(),
                        membership.tax_type.into(),
                        membership.in_excel.into(),
                    ],
                ))
                .await
                .map_err(RepositoryError::from)?;
        }
        Ok(())
    }
}

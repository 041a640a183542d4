//! Historical tax rows looked up by importer VAT number.

use icp_core::icp::{IcpError, TaxObject};
use icp_core::vat::{HistoricalRow, VatRepository};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, FromQueryResult};
use std::sync::Arc;

use super::error::RepositoryError;
use super::query::{TextRow, statement, texts};
use crate::sql;

#[derive(Debug, FromQueryResult)]
struct HistoricalTaxRow {
    bill_no: Option<String>,
    tax_type: Option<String>,
    item_number: Option<String>,
    destined: String,
    processing_status: Option<i64>,
    process_code: String,
    customs_id: Option<String>,
    invoice_date: Option<String>,
    currency: String,
    local_currency_value: Option<Decimal>,
    import_duty: Option<Decimal>,
    dutch_cost: String,
    dutch_vat: String,
    hs_code: Option<String>,
    net_weight: Option<Decimal>,
    quantity: Option<i64>,
    country_prefix: String,
    duty_party: Option<String>,
    partner_name: Option<String>,
    country_of_destination: Option<String>,
    vat_no: Option<String>,
    eori_no: Option<String>,
    importer_address_code: Option<String>,
    address_code: Option<String>,
    address_detail: Option<String>,
    postal_code: Option<String>,
    city: Option<String>,
    product_no: Option<String>,
    description: Option<String>,
    mrn: Option<String>,
    company_name: Option<String>,
    mode: Option<String>,
}

impl TryFrom<HistoricalTaxRow> for HistoricalRow {
    type Error = RepositoryError;

    fn try_from(r: HistoricalTaxRow) -> Result<Self, Self::Error> {
        let status = r.processing_status.unwrap_or_default();
        let processing_status = u32::try_from(status).map_err(|_| RepositoryError::InvalidValue {
            column: "processing_status",
            value: status.to_string(),
        })?;

        let row = TaxObject {
            bill_no: r.bill_no.unwrap_or_default(),
            tax_type: r.tax_type.unwrap_or_default(),
            item_number: r.item_number.unwrap_or_default(),
            destined: r.destined,
            process_code: r.process_code,
            customs_id: r.customs_id.unwrap_or_default(),
            invoice_date: r.invoice_date.unwrap_or_default(),
            currency: r.currency,
            local_currency_value: r.local_currency_value.unwrap_or_default(),
            import_duty: r.import_duty.unwrap_or_default(),
            dutch_cost: r.dutch_cost,
            dutch_vat: r.dutch_vat,
            hs_code: r.hs_code.unwrap_or_default(),
            net_weight: r.net_weight.unwrap_or_default(),
            quantity: r.quantity.unwrap_or_default(),
            country_prefix: r.country_prefix,
            duty_party: r.duty_party.unwrap_or_default(),
            partner_name: r.partner_name.unwrap_or_default(),
            country_of_destination: r.country_of_destination.unwrap_or_default(),
            vat_no: r.vat_no.unwrap_or_default(),
            eori_no: r.eori_no.unwrap_or_default(),
            importer_address_code: r.importer_address_code.unwrap_or_default(),
            address_code: r.address_code.unwrap_or_default(),
            address_detail: r.address_detail.unwrap_or_default(),
            postal_code: r.postal_code.unwrap_or_default(),
            city: r.city.unwrap_or_default(),
            product_no: r.product_no.unwrap_or_default(),
            description: r.description.unwrap_or_default(),
            mrn: r.mrn.unwrap_or_default(),
            company_name: r.company_name.unwrap_or_default(),
            mode: r.mode.unwrap_or_default(),
            in_icp_files: String::new(),
            has_inspection_fine: String::new(),
        };
        Ok(Self {
            row,
            processing_status,
        })
    }
}

/// VAT history repository.
#[derive(Debug, Clone)]
pub struct VatHistoryRepository {
    db: Arc<DatabaseConnection>,
}

impl VatHistoryRepository {
    /// Creates a new VAT history repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl VatRepository for VatHistoryRepository {
    async fn customs_ids_for_vat(&self, vat_no: &str) -> Result<Vec<String>, IcpError> {
        let rows = TextRow::find_by_statement(statement(sql::CUSTOMS_IDS_FOR_VAT, [vat_no.into()]))
            .all(self.db.as_ref())
            .await
            .map_err(RepositoryError::from)?;
        Ok(texts(rows))
    }

    async fn historical_rows(&self, customs_id: &str) -> Result<Vec<HistoricalRow>, IcpError> {
        let rows =
            HistoricalTaxRow::find_by_statement(statement(sql::HISTORICAL_ROWS, [customs_id.into()]))
                .all(self.db.as_ref())
                .await
                .map_err(RepositoryError::from)?;
        let rows = rows
            .into_iter()
            .map(HistoricalRow::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn row(status: i64) -> BTreeMap<&'static str, Value> {
        let text = |v: &str| Value::from(v.to_string());
        let mut row = BTreeMap::new();
        for column in [
            "bill_no", "tax_type", "item_number", "customs_id", "invoice_date", "hs_code",
            "duty_party", "partner_name", "country_of_destination", "vat_no", "eori_no",
            "importer_address_code", "address_code", "address_detail", "postal_code", "city",
            "product_no", "description", "mrn", "company_name", "mode",
        ] {
            row.insert(column, text(column));
        }
        for column in ["destined", "dutch_cost", "dutch_vat", "currency", "country_prefix"] {
            row.insert(column, text(column));
        }
        row.insert("process_code", text("TAX"));
        row.insert("processing_status", Value::from(status));
        row.insert("local_currency_value", Value::from(dec!(10)));
        row.insert("import_duty", Value::from(dec!(1)));
        row.insert("net_weight", Value::Decimal(None));
        row.insert("quantity", Value::from(3i64));
        row
    }

    #[tokio::test]
    async fn test_historical_rows() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![row(4)]])
            .into_connection();
        let repo = VatHistoryRepository::new(Arc::new(db));

        let rows = repo.historical_rows("C1").await.unwrap();
        assert_eq!(rows[0].processing_status, 4);
        assert_eq!(rows[0].row.customs_id, "customs_id");
        assert_eq!(rows[0].row.net_weight, Decimal::ZERO);
        assert_eq!(rows[0].row.in_icp_files, "");
    }

    #[tokio::test]
    async fn test_negative_status_rejected() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![row(-1)]])
            .into_connection();
        let repo = VatHistoryRepository::new(Arc::new(db));

        let err = repo.historical_rows("C1").await.unwrap_err();
        assert!(err.to_string().contains("processing_status"));
    }
}

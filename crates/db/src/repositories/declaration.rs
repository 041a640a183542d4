//! Declaration reads for ICP generation.

use icp_core::icp::{
    BaseInfo, DeclarationKind, DeclarationRepository, Delivery, IcpError, Importer,
    PodFileObject, PodQuery, ProcessCode, TaxLine, TaxQuery,
};
use icp_shared::ReportMonth;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, FromQueryResult};
use std::sync::Arc;
use tracing::debug;

use super::error::RepositoryError;
use super::query::{CountRow, TextRow, statement, texts};
use crate::sql;

#[derive(Debug, FromQueryResult)]
struct TaxLineRow {
    tax_type: Option<String>,
    item_number: Option<String>,
    destined: String,
    declared_amount: Option<Decimal>,
    import_duty: Option<Decimal>,
    dutch_cost: String,
    dutch_vat: String,
    country_prefix: String,
    process_code: String,
    invoice_date: Option<String>,
    product_no: Option<String>,
    hs_code: Option<String>,
    net_weight: Option<Decimal>,
    quantity: Option<i64>,
    description: Option<String>,
    currency: String,
}

impl From<TaxLineRow> for TaxLine {
    fn from(row: TaxLineRow) -> Self {
        Self {
            tax_type: row.tax_type.unwrap_or_default(),
            item_number: row.item_number.unwrap_or_default(),
            destined: row.destined,
            declared_amount: row.declared_amount.unwrap_or_default(),
            import_duty: row.import_duty.unwrap_or_default(),
            dutch_cost: row.dutch_cost,
            dutch_vat: row.dutch_vat,
            country_prefix: row.country_prefix,
            process_code: row.process_code,
            invoice_date: row.invoice_date.unwrap_or_default(),
            product_no: row.product_no.unwrap_or_default(),
            hs_code: row.hs_code.unwrap_or_default(),
            net_weight: row.net_weight.unwrap_or_default(),
            quantity: row.quantity.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            currency: row.currency,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct BaseInfoRow {
    customs_id: Option<String>,
    declare_country: Option<String>,
    mrn: Option<String>,
    duty_party: Option<String>,
    bill_no: Option<String>,
    mode: Option<String>,
    partner_name: Option<String>,
}

impl From<BaseInfoRow> for BaseInfo {
    fn from(row: BaseInfoRow) -> Self {
        Self {
            customs_id: row.customs_id.unwrap_or_default(),
            declare_country: row.declare_country.unwrap_or_default(),
            mrn: row.mrn.unwrap_or_default(),
            duty_party: row.duty_party.unwrap_or_default(),
            bill_no: row.bill_no.unwrap_or_default(),
            mode: row.mode.unwrap_or_default(),
            partner_name: row.partner_name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ImporterRow {
    vat_no: Option<String>,
    eori_no: Option<String>,
    address_code: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct DeliveryRow {
    address_code: Option<String>,
    country: Option<String>,
    city: Option<String>,
    address_detail: Option<String>,
    postal_code: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct PodRow {
    bill_no: Option<String>,
    customs_id: Option<String>,
    mrn: Option<String>,
    tracking_no: Option<String>,
    pod_link: Option<String>,
}

impl From<PodRow> for PodFileObject {
    fn from(row: PodRow) -> Self {
        Self {
            bill_no: row.bill_no.unwrap_or_default(),
            customs_id: row.customs_id.unwrap_or_default(),
            mrn: row.mrn.unwrap_or_default(),
            tracking_no: row.tracking_no.unwrap_or_default(),
            pod_link: row.pod_link.filter(|l| !l.is_empty()),
        }
    }
}

/// Declaration repository for ICP generation.
#[derive(Debug, Clone)]
pub struct DeclarationStore {
    db: Arc<DatabaseConnection>,
}

impl DeclarationStore {
    /// Creates a new declaration repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn text(&self, sql: &str, customs_id: &str) -> Result<Option<String>, RepositoryError> {
        let row = TextRow::find_by_statement(statement(sql, [customs_id.into()]))
            .one(self.db.as_ref())
            .await?;
        Ok(row.and_then(|r| r.value))
    }

    async fn count(&self, sql: &str, key: &str) -> Result<i64, RepositoryError> {
        let row = CountRow::find_by_statement(statement(sql, [key.into()]))
            .one(self.db.as_ref())
            .await?;
        Ok(CountRow::get(row))
    }
}

fn tax_sql(query: TaxQuery) -> String {
    match query {
        TaxQuery::EuLinked => sql::eu_linked_tax(),
        TaxQuery::NonEu => sql::non_eu_tax(),
        TaxQuery::SplitArticles => sql::split_tax(),
    }
}

impl DeclarationRepository for DeclarationStore {
    async fn duty_parties_for_month(&self, month: ReportMonth) -> Result<Vec<String>, IcpError> {
        let rows = TextRow::find_by_statement(statement(
            sql::DUTY_PARTIES_FOR_MONTH,
            [month.to_string().into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(RepositoryError::from)?;
        Ok(texts(rows))
    }

    async fn eligible_customs_ids(
        &self,
        duty_party: &str,
        month: ReportMonth,
    ) -> Result<Vec<String>, IcpError> {
        let rows = TextRow::find_by_statement(statement(
            sql::ELIGIBLE_CUSTOMS_IDS,
            [duty_party.into(), month.to_string().into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(RepositoryError::from)?;
        Ok(texts(rows))
    }

    async fn declaration_kind(&self, customs_id: &str) -> Result<DeclarationKind, IcpError> {
        let has_split = self.count(sql::HAS_SPLIT, customs_id).await?;
        Ok(if has_split == 1 {
            DeclarationKind::Split
        } else {
            DeclarationKind::Ordinary
        })
    }

    async fn tax_lines(
        &self,
        query: TaxQuery,
        customs_id: &str,
        code: ProcessCode,
    ) -> Result<Vec<TaxLine>, IcpError> {
        let rows = TaxLineRow::find_by_statement(statement(
            &tax_sql(query),
            [customs_id.into(), code.as_str().into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(RepositoryError::from)?;
        debug!(customs_id, ?query, code = code.as_str(), rows = rows.len(), "Tax lines");
        Ok(rows.into_iter().map(TaxLine::from).collect())
    }

    async fn base_info(&self, customs_id: &str) -> Result<Option<BaseInfo>, IcpError> {
        let row = BaseInfoRow::find_by_statement(statement(sql::BASE_INFO, [customs_id.into()]))
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::from)?;
        Ok(row.map(BaseInfo::from))
    }

    async fn importer(&self, customs_id: &str) -> Result<Option<Importer>, IcpError> {
        let row = ImporterRow::find_by_statement(statement(sql::IMPORTER, [customs_id.into()]))
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::from)?;
        Ok(row.map(|r| Importer {
            vat_no: r.vat_no.unwrap_or_default(),
            eori_no: r.eori_no.unwrap_or_default(),
            address_code: r.address_code.unwrap_or_default(),
        }))
    }

    async fn delivery(&self, customs_id: &str) -> Result<Option<Delivery>, IcpError> {
        let row = DeliveryRow::find_by_statement(statement(sql::DELIVERY, [customs_id.into()]))
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::from)?;
        Ok(row.map(|r| Delivery {
            address_code: r.address_code.unwrap_or_default(),
            country: r.country.unwrap_or_default(),
            city: r.city.unwrap_or_default(),
            address_detail: r.address_detail.unwrap_or_default(),
            postal_code: r.postal_code.unwrap_or_default(),
        }))
    }

    async fn company_name(&self, customs_id: &str) -> Result<Option<String>, IcpError> {
        Ok(self.text(sql::COMPANY_NAME, customs_id).await?)
    }

    async fn inspection_fine_count(&self, customs_id: &str) -> Result<u64, IcpError> {
        let total = self.count(sql::INSPECTION_FINE_COUNT, customs_id).await?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn icp_names_containing(&self, customs_id: &str) -> Result<Option<String>, IcpError> {
        Ok(self.text(sql::ICP_NAMES_CONTAINING, customs_id).await?)
    }

    async fn service_key(&self, customs_id: &str) -> Result<Option<String>, IcpError> {
        Ok(self.text(sql::SERVICE_KEY, customs_id).await?)
    }

    async fn pod_records(
        &self,
        customs_id: &str,
        query: PodQuery,
    ) -> Result<Vec<PodFileObject>, IcpError> {
        let sql = match query {
            PodQuery::AllTracking => sql::pod_all_tracking(),
            PodQuery::FirstTracking => sql::pod_first_tracking(),
        };
        let rows = PodRow::find_by_statement(statement(&sql, [customs_id.into()]))
            .all(self.db.as_ref())
            .await
            .map_err(RepositoryError::from)?;
        Ok(rows.into_iter().map(PodFileObject::from).collect())
    }

    async fn needs_vat_note(&self, duty_party: &str) -> Result<bool, IcpError> {
        Ok(self.count(sql::NEEDS_VAT_NOTE, duty_party).await? == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn text(v: &str) -> Value {
        Value::from(v.to_string())
    }

    fn null_text() -> Value {
        Value::String(None)
    }

    #[tokio::test]
    async fn test_base_info_defaults_missing_agency() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![BTreeMap::from([
                ("customs_id", text("C1")),
                ("declare_country", text("BE")),
                ("mrn", text("22BE0001")),
                ("duty_party", text("BE0796544895")),
                ("bill_no", text("B-1")),
                ("mode", text("AIR")),
                ("partner_name", null_text()),
            ])]])
            .into_connection();
        let store = DeclarationStore::new(Arc::new(db));

        let base = store.base_info("C1").await.unwrap().unwrap();
        assert_eq!(base.declare_country, "BE");
        assert_eq!(base.partner_name, "");
    }

    #[tokio::test]
    async fn test_tax_lines_decode_amounts() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![BTreeMap::from([
                ("tax_type", text("A00")),
                ("item_number", text("1")),
                ("destined", text("4a")),
                ("declared_amount", Value::from(dec!(100.5))),
                ("import_duty", Value::from(dec!(12.56))),
                ("dutch_cost", text("0.00")),
                ("dutch_vat", text("0.00")),
                ("country_prefix", text("NL")),
                ("process_code", text("TAX")),
                ("invoice_date", text("2022/09/01")),
                ("product_no", text("P-1")),
                ("hs_code", text("6109100010")),
                ("net_weight", Value::from(dec!(1.5))),
                ("quantity", Value::from(2i64)),
                ("description", null_text()),
                ("currency", text("EUR")),
            ])]])
            .into_connection();
        let store = DeclarationStore::new(Arc::new(db));

        let lines = store
            .tax_lines(TaxQuery::EuLinked, "C1", ProcessCode::Tax)
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].declared_amount, dec!(100.5));
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].description, "");
    }

    #[tokio::test]
    async fn test_declaration_kind() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![BTreeMap::from([("total", Value::from(1i64))])]])
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection();
        let store = DeclarationStore::new(Arc::new(db));

        assert_eq!(
            store.declaration_kind("C1").await.unwrap(),
            DeclarationKind::Split
        );
        assert_eq!(
            store.declaration_kind("C2").await.unwrap(),
            DeclarationKind::Ordinary
        );
    }

    #[tokio::test]
    async fn test_empty_pod_link_is_none() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![BTreeMap::from([
                ("bill_no", text("B-1")),
                ("customs_id", text("C1")),
                ("mrn", text("MRN")),
                ("tracking_no", text("T-1")),
                ("pod_link", text("")),
            ])]])
            .into_connection();
        let store = DeclarationStore::new(Arc::new(db));

        let pods = store.pod_records("C1", PodQuery::AllTracking).await.unwrap();
        assert_eq!(pods[0].tracking_no, "T-1");
        assert_eq!(pods[0].pod_link, None);
    }

    #[test]
    fn test_tax_sql_variants() {
        assert!(tax_sql(TaxQuery::EuLinked).contains("service_customs_value_process"));
        assert!(tax_sql(TaxQuery::NonEu).contains("bd.country = sca.country"));
        assert!(tax_sql(TaxQuery::SplitArticles).contains("service_customs_supply_article"));
    }
}

//! VAT-scoped ICP generation.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use icp_shared::ReportMonth;
use tracing::{error, info, warn};

use super::repository::VatRepository;
use crate::icp::{
    DeclarationRepository, GenerationLedger, GenerationRepository, IcpError, IcpFileName,
    IcpReport, IcpSettings, NewGeneration, PeriodKey, PodFileObject, TaxFileObject, TaxObject,
    pods_for, write_workbook,
};

/// Builds `VAT{number}_{YYYYMM}_{time}.xlsx` files.
///
/// The file is dated by the generation month, not by the declarations it holds, and the
/// declarations are not recorded as members of it.
pub struct VatService<V, R, G>
where
    V: VatRepository,
    R: DeclarationRepository,
    G: GenerationRepository,
{
    history: Arc<V>,
    declarations: Arc<R>,
    ledger: GenerationLedger<G>,
    settings: IcpSettings,
}

impl<V, R, G> VatService<V, R, G>
where
    V: VatRepository,
    R: DeclarationRepository,
    G: GenerationRepository,
{
    /// Create a new service.
    #[must_use]
    pub fn new(
        history: Arc<V>,
        declarations: Arc<R>,
        generations: Arc<G>,
        settings: IcpSettings,
    ) -> Self {
        Self {
            history,
            declarations,
            ledger: GenerationLedger::new(generations),
            settings,
        }
    }

    /// Generates the file now.
    ///
    /// # Errors
    ///
    /// See [`VatService::generate_at`].
    pub async fn generate(&self, vat_no: &str) -> Result<IcpReport, IcpError> {
        self.generate_at(vat_no, Utc::now()).await
    }

    /// Generates the file as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`IcpError::NoDeclarations`] when the VAT number has no declarations, or a
    /// repository error if they cannot be listed.
    pub async fn generate_at(
        &self,
        vat_no: &str,
        now: DateTime<Utc>,
    ) -> Result<IcpReport, IcpError> {
        let vat_no = vat_no.trim();
        let customs_ids = self.history.customs_ids_for_vat(vat_no).await?;
        if customs_ids.is_empty() {
            return Err(IcpError::NoDeclarations(format!("VAT number {vat_no}")));
        }

        let local = now.with_timezone(&Local).naive_local();
        let month = ReportMonth::of(&local);
        let name = IcpFileName::generate(&format!("VAT{vat_no}"), month, &local);
        info!(vat_no, file = %name, declarations = customs_ids.len(), "Generating VAT ICP file");

        let mut errors = Vec::new();
        let mut rows: Vec<TaxObject> = Vec::new();
        let mut tax_files: Vec<TaxFileObject> = Vec::new();
        let mut pods: Vec<PodFileObject> = Vec::new();

        for (idx, customs_id) in customs_ids.iter().enumerate() {
            info!(idx, customs_id = %customs_id, "Reading historical declaration");
            let historical = match self.history.historical_rows(customs_id).await {
                Ok(historical) if !historical.is_empty() => historical,
                Ok(_) => {
                    warn!(customs_id = %customs_id, "No historical rows");
                    errors.push(IcpError::missing("ICP fill data", customs_id.as_str()));
                    continue;
                }
                Err(e) => {
                    errors.push(IcpError::lookup("ICP fill data", customs_id.as_str(), &e));
                    continue;
                }
            };

            let first = &historical[0];
            tax_files.push(TaxFileObject {
                customs_id: customs_id.clone(),
                mrn: first.row.mrn.clone(),
                tax_type: first.processing_status,
                link: self.settings.links.nl_link(customs_id),
            });
            rows.extend(historical.into_iter().map(|h| h.row));

            match pods_for(self.declarations.as_ref(), customs_id).await {
                Ok(found) => pods.extend(found),
                Err(e) => warn!(customs_id = %customs_id, error = %e, "Tracking POD lookup failed"),
            }
        }

        let written = write_workbook(
            &self.settings.save_dir,
            &name,
            &rows,
            &tax_files,
            &pods,
            &mut errors,
        )
        .await;

        let generation = NewGeneration {
            period: PeriodKey::new(vat_no, month),
            name: name.as_str().to_string(),
            total: customs_ids.len() as u64,
            status: written,
            vat_note: String::new(),
            generated_at: now.naive_utc(),
        };
        if let Err(e) = self.ledger.record(generation).await {
            error!(file = %name, error = %e, "Failed to record generation");
            errors.push(e);
        }

        Ok(IcpReport {
            file_name: name.as_str().to_string(),
            path: name.path(&self.settings.save_dir),
            duty_party: vat_no.to_string(),
            month,
            declarations: customs_ids.len(),
            rows: rows.len(),
            written,
            vat_note: None,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icp::mock::{MockDeclarations, MockGenerations};
    use crate::icp::{PodQuery, ReceiptLinks};
    use crate::vat::HistoricalRow;
    use chrono::TimeZone;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct MockHistory {
        ids: HashMap<String, Vec<String>>,
        rows: HashMap<String, Vec<HistoricalRow>>,
        failing: HashSet<String>,
    }

    impl VatRepository for MockHistory {
        async fn customs_ids_for_vat(&self, vat_no: &str) -> Result<Vec<String>, IcpError> {
            Ok(self.ids.get(vat_no).cloned().unwrap_or_default())
        }

        async fn historical_rows(&self, customs_id: &str) -> Result<Vec<HistoricalRow>, IcpError> {
            if self.failing.contains(customs_id) {
                return Err(IcpError::repository("lost connection"));
            }
            Ok(self.rows.get(customs_id).cloned().unwrap_or_default())
        }
    }

    fn historical(customs_id: &str, item: &str, status: u32) -> HistoricalRow {
        HistoricalRow {
            row: TaxObject {
                customs_id: customs_id.to_string(),
                item_number: item.to_string(),
                mrn: format!("MRN-{customs_id}"),
                ..TaxObject::default()
            },
            processing_status: status,
        }
    }

    fn settings(dir: &std::path::Path) -> IcpSettings {
        IcpSettings {
            save_dir: dir.to_path_buf(),
            links: ReceiptLinks::new("https://board.test/nl/{customs_id}", "unused"),
        }
    }

    #[tokio::test]
    async fn test_vat_file_collects_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = MockHistory::default();
        history.ids.insert(
            "NL123".to_string(),
            vec!["H1".to_string(), "H2".to_string(), "H3".to_string()],
        );
        history.rows.insert(
            "H1".to_string(),
            vec![historical("H1", "1", 4), historical("H1", "2", 4)],
        );
        history.failing.insert("H3".to_string());
        let mut declarations = MockDeclarations::default();
        declarations.pods.insert(
            ("H1".to_string(), PodQuery::AllTracking),
            vec![PodFileObject::default()],
        );
        let generations = Arc::new(MockGenerations::default());
        let service = VatService::new(
            Arc::new(history),
            Arc::new(declarations),
            Arc::clone(&generations),
            settings(dir.path()),
        );
        let now = Utc.with_ymd_and_hms(2023, 3, 15, 12, 0, 0).unwrap();

        let report = service.generate_at(" NL123 ", now).await.unwrap();

        assert!(report.file_name.starts_with("VATNL123_"));
        assert_eq!(report.declarations, 3);
        assert_eq!(report.rows, 2);
        assert_eq!(report.errors.len(), 2);
        assert!(report.written);
        assert!(report.path.exists());

        let records = generations.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duty_party, "NL123");
        assert_eq!(records[0].total, 3);
        assert!(generations.memberships().is_empty());
    }

    #[tokio::test]
    async fn test_vat_without_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let service = VatService::new(
            Arc::new(MockHistory::default()),
            Arc::new(MockDeclarations::default()),
            Arc::new(MockGenerations::default()),
            settings(dir.path()),
        );

        let err = service.generate("NL999").await.unwrap_err();
        assert!(matches!(err, IcpError::NoDeclarations(_)));
    }
}

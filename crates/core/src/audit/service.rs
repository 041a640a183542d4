//! Audit workbook generation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use icp_shared::ReportMonth;
use icp_shared::config::AuditConfig;
use tracing::{info, warn};

use super::error::AuditError;
use super::repository::AuditRepository;
use super::types::Screenshot;
use crate::icp::audit_file_name;
use crate::storage::StorageService;
use crate::workbook::AuditWorkbook;

/// Output settings for the audit workbook.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    /// Directory the workbook is written to.
    pub save_dir: PathBuf,
    /// Scratch directory for downloaded screenshots.
    pub tmp_dir: PathBuf,
}

impl From<&AuditConfig> for AuditSettings {
    fn from(config: &AuditConfig) -> Self {
        Self {
            save_dir: config.save_dir.clone(),
            tmp_dir: config.tmp_dir.clone(),
        }
    }
}

/// Outcome of an audit run.
#[derive(Debug)]
pub struct AuditReport {
    /// `{YYYY-MM}.xlsx`
    pub file_name: String,
    /// Full path of the workbook.
    pub path: PathBuf,
    /// Rows written.
    pub rows: usize,
    /// Screenshots embedded.
    pub screenshots: usize,
    /// Per-row failures.
    pub errors: Vec<AuditError>,
}

/// Builds the monthly audit workbook.
pub struct AuditService<A: AuditRepository> {
    repo: Arc<A>,
    storage: Option<StorageService>,
    settings: AuditSettings,
}

impl<A: AuditRepository> AuditService<A> {
    /// Create a new audit service. Without storage, stored screenshots are reported as errors.
    #[must_use]
    pub fn new(repo: Arc<A>, storage: Option<StorageService>, settings: AuditSettings) -> Self {
        Self {
            repo,
            storage,
            settings,
        }
    }

    /// Writes `{save_dir}/{YYYY-MM}.xlsx` with one row per submitted declaration.
    ///
    /// Row and screenshot failures are collected; the file is written regardless.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration list cannot be read, nothing was submitted,
    /// or the workbook cannot be saved.
    pub async fn generate(&self, month: ReportMonth) -> Result<AuditReport, AuditError> {
        let ids = self.repo.submitted_customs_ids(month).await?;
        if ids.is_empty() {
            return Err(AuditError::NoDeclarations(month.to_string()));
        }

        let mut sheet = AuditWorkbook::new()?;
        let mut errors = Vec::new();
        let mut screenshots = 0;

        for id in &ids {
            let record = match self.repo.audit_record(id).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    errors.push(AuditError::row_failed(id, "no article found"));
                    continue;
                }
                Err(e) => {
                    errors.push(AuditError::row_failed(id, e.to_string()));
                    continue;
                }
            };

            let row = sheet.push(&record)?;
            if let Screenshot::Stored(key) = record.screenshot() {
                match self.embed(&mut sheet, row, id, key).await {
                    Ok(()) => screenshots += 1,
                    Err(e) => {
                        warn!(customs_id = %id, key, error = %e, "Screenshot not embedded");
                        errors.push(e);
                    }
                }
            }
        }

        tokio::fs::create_dir_all(&self.settings.save_dir)
            .await
            .map_err(|e| AuditError::io(&self.settings.save_dir, &e))?;
        let file_name = audit_file_name(month);
        let path = self.settings.save_dir.join(&file_name);
        let rows = sheet.len();
        sheet.save(&path)?;

        info!(
            month = %month,
            rows,
            screenshots,
            errors = errors.len(),
            path = %path.display(),
            "Audit workbook written"
        );

        Ok(AuditReport {
            file_name,
            path,
            rows,
            screenshots,
            errors,
        })
    }

    async fn embed(
        &self,
        sheet: &mut AuditWorkbook,
        row: u32,
        customs_id: &str,
        key: &str,
    ) -> Result<(), AuditError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| AuditError::StorageUnavailable(customs_id.to_string()))?;
        let local = scratch_path(&self.settings.tmp_dir, key);
        storage.download_to(key, &local).await?;
        sheet.embed_screenshot(row, &local)?;
        Ok(())
    }
}

/// Flattens a storage key into a single file name under the scratch directory.
fn scratch_path(tmp_dir: &Path, key: &str) -> PathBuf {
    let flat = key.trim_start_matches('/').replace(['/', '\\'], "_");
    tmp_dir.join(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditRecord;
    use crate::storage::{StorageConfig, StorageProvider};
    use calamine::{Reader, Xlsx, open_workbook};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    // 1x1 transparent PNG.
    const PIXEL: [u8; 67] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[derive(Default)]
    struct MockAudit {
        ids: Vec<String>,
        records: HashMap<String, AuditRecord>,
        failing: Vec<String>,
    }

    impl MockAudit {
        fn add(&mut self, id: &str, screenshot: Option<&str>) {
            self.ids.push(id.to_string());
            self.records.insert(
                id.to_string(),
                AuditRecord {
                    bill_no: format!("BILL-{id}"),
                    customs_id: id.to_string(),
                    mrn: format!("MRN-{id}"),
                    item_number: "1".to_string(),
                    hs_code: "6109100010".to_string(),
                    duty_amount: dec!(12),
                    declared_value: dec!(100),
                    price_screenshot: screenshot.map(str::to_string),
                    ..AuditRecord::default()
                },
            );
        }
    }

    impl AuditRepository for MockAudit {
        async fn submitted_customs_ids(&self, _month: ReportMonth) -> Result<Vec<String>, AuditError> {
            Ok(self.ids.clone())
        }

        async fn audit_record(&self, customs_id: &str) -> Result<Option<AuditRecord>, AuditError> {
            if self.failing.iter().any(|f| f == customs_id) {
                return Err(AuditError::repository("connection reset"));
            }
            Ok(self.records.get(customs_id).cloned())
        }
    }

    fn month() -> ReportMonth {
        ReportMonth::parse("2022-09").unwrap()
    }

    fn settings(root: &Path) -> AuditSettings {
        AuditSettings {
            save_dir: root.join("audit"),
            tmp_dir: root.join("tmp"),
        }
    }

    fn local_store(root: &Path) -> StorageService {
        StorageService::from_config(StorageConfig::new(StorageProvider::local_fs(root))).unwrap()
    }

    #[test]
    fn test_scratch_path_is_flat() {
        let path = scratch_path(Path::new("/tmp/audit"), "/price/2022/a.png");
        assert_eq!(path, PathBuf::from("/tmp/audit/price_2022_a.png"));
    }

    #[tokio::test]
    async fn test_generate_embeds_and_collects_errors() {
        let out = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(store.path().join("price")).unwrap();
        std::fs::write(store.path().join("price/A1.png"), PIXEL).unwrap();

        let mut repo = MockAudit::default();
        repo.add("A1", Some("/price/A1.png"));
        repo.add("A2", Some("https://shots.example.com/A2.png"));
        repo.add("A3", None);
        repo.ids.push("A4".to_string());
        repo.failing.push("A3".to_string());

        let service = AuditService::new(
            Arc::new(repo),
            Some(local_store(store.path())),
            settings(out.path()),
        );
        let report = service.generate(month()).await.unwrap();

        assert_eq!(report.file_name, "2022-09.xlsx");
        assert_eq!(report.rows, 2);
        assert_eq!(report.screenshots, 1);
        assert_eq!(report.errors.len(), 2);
        assert!(report
            .errors
            .iter()
            .all(|e| matches!(e, AuditError::RowFailed { .. })));

        let mut book: Xlsx<_> = open_workbook(&report.path).unwrap();
        let range = book.worksheet_range("Sheet1").unwrap();
        assert_eq!(range.height(), 3);
        assert_eq!(range.get((1, 1)).unwrap().to_string(), "A1");
        assert_eq!(range.get((1, 5)).unwrap().to_string(), "12.00%");
        assert_eq!(
            range.get((2, 10)).unwrap().to_string(),
            "https://shots.example.com/A2.png"
        );
    }

    #[tokio::test]
    async fn test_missing_screenshot_keeps_row() {
        let out = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let mut repo = MockAudit::default();
        repo.add("A1", Some("price/missing.png"));

        let service = AuditService::new(
            Arc::new(repo),
            Some(local_store(store.path())),
            settings(out.path()),
        );
        let report = service.generate(month()).await.unwrap();

        assert_eq!(report.rows, 1);
        assert_eq!(report.screenshots, 0);
        assert!(matches!(report.errors[0], AuditError::Storage(_)));
        assert!(report.path.exists());
    }

    #[tokio::test]
    async fn test_stored_screenshot_without_storage() {
        let out = tempfile::tempdir().unwrap();
        let mut repo = MockAudit::default();
        repo.add("A1", Some("price/a.png"));

        let service = AuditService::new(Arc::new(repo), None, settings(out.path()));
        let report = service.generate(month()).await.unwrap();

        assert_eq!(report.rows, 1);
        assert!(matches!(
            report.errors[0],
            AuditError::StorageUnavailable(ref id) if id == "A1"
        ));
    }

    #[tokio::test]
    async fn test_nothing_submitted() {
        let out = tempfile::tempdir().unwrap();
        let service = AuditService::new(
            Arc::new(MockAudit::default()),
            None,
            settings(out.path()),
        );
        let err = service.generate(month()).await.unwrap_err();
        assert!(matches!(err, AuditError::NoDeclarations(ref m) if m == "2022-09"));
        assert!(!out.path().join("audit").exists());
    }
}

//! ICP batch orchestration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use icp_shared::ReportMonth;
use icp_shared::config::IcpConfig;
use tracing::{error, info, warn};

use super::assembler::{DeclarationAssembler, ReceiptLinks};
use super::error::{Collected, IcpError};
use super::filename::IcpFileName;
use super::generation::{GenerationLedger, GenerationMembership, NewGeneration, PeriodKey};
use super::repository::{DeclarationRepository, GenerationRepository};
use super::types::{PodFileObject, TaxFileObject, TaxObject};
use crate::archive::{Downloader, HttpDownloader, VatNoteArchiver};
use crate::workbook::IcpWorkbook;

/// Output settings for ICP workbooks.
#[derive(Debug, Clone)]
pub struct IcpSettings {
    /// Root directory; files land in `{save_dir}/{YYYY}/{MM}/`.
    pub save_dir: PathBuf,
    /// Tax receipt link templates.
    pub links: ReceiptLinks,
}

impl IcpSettings {
    /// Settings from the `icp` configuration section.
    #[must_use]
    pub fn from_config(config: &IcpConfig) -> Self {
        Self {
            save_dir: config.save_dir.clone(),
            links: ReceiptLinks::new(&config.tax_receipt_nl_url, &config.tax_receipt_be_url),
        }
    }
}

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcpRequest {
    /// Every eligible declaration of a duty party in a month, into a new file.
    Period {
        /// Duty party VAT number.
        duty_party: String,
        /// Reporting month.
        month: ReportMonth,
    },
    /// Explicit declarations, written to an existing file name.
    Append {
        /// Name of the file to regenerate, e.g. `BE0796544895_202209_01154020.xlsx`.
        file_name: String,
        /// Declarations to include.
        customs_ids: Vec<String>,
    },
}

/// Outcome of one generation.
#[derive(Debug)]
pub struct IcpReport {
    /// Generated file name.
    pub file_name: String,
    /// Full path of the workbook.
    pub path: PathBuf,
    /// Duty party the file belongs to.
    pub duty_party: String,
    /// Reporting month.
    pub month: ReportMonth,
    /// Declarations requested.
    pub declarations: usize,
    /// Tax rows written.
    pub rows: usize,
    /// Whether the workbook reached disk.
    pub written: bool,
    /// VAT-note archive name, when one was built.
    pub vat_note: Option<String>,
    /// Errors accumulated along the way.
    pub errors: Vec<IcpError>,
}

/// Builds ICP workbooks and records them.
pub struct IcpService<R, G, D = HttpDownloader>
where
    R: DeclarationRepository,
    G: GenerationRepository,
    D: Downloader,
{
    declarations: Arc<R>,
    assembler: DeclarationAssembler<R>,
    ledger: GenerationLedger<G>,
    settings: IcpSettings,
    vat_notes: Option<VatNoteArchiver<D>>,
}

impl<R: DeclarationRepository, G: GenerationRepository> IcpService<R, G> {
    /// Create a new service without VAT-note archives.
    #[must_use]
    pub fn new(declarations: Arc<R>, generations: Arc<G>, settings: IcpSettings) -> Self {
        Self {
            assembler: DeclarationAssembler::new(
                Arc::clone(&declarations),
                settings.links.clone(),
            ),
            declarations,
            ledger: GenerationLedger::new(generations),
            settings,
            vat_notes: None,
        }
    }
}

impl<R, G, D> IcpService<R, G, D>
where
    R: DeclarationRepository,
    G: GenerationRepository,
    D: Downloader,
{
    /// Build VAT-note archives for duty parties that require them.
    #[must_use]
    pub fn with_vat_notes<D2: Downloader>(
        self,
        archiver: VatNoteArchiver<D2>,
    ) -> IcpService<R, G, D2> {
        IcpService {
            declarations: self.declarations,
            assembler: self.assembler,
            ledger: self.ledger,
            settings: self.settings,
            vat_notes: Some(archiver),
        }
    }

    /// Generates one file per duty party active in `month`.
    ///
    /// A duty party whose generation fails is reported in the errors; the others still run.
    ///
    /// # Errors
    ///
    /// Returns [`IcpError::NoDutyParties`] when nobody filed tax in the month, or a repository
    /// error if the duty parties cannot be listed.
    pub async fn generate_monthly(
        &self,
        month: ReportMonth,
    ) -> Result<Collected<Vec<IcpReport>>, IcpError> {
        let parties = self.declarations.duty_parties_for_month(month).await?;
        if parties.is_empty() {
            return Err(IcpError::NoDutyParties(month.to_string()));
        }
        info!(%month, duty_parties = parties.len(), "Generating monthly ICP files");

        let mut reports = Vec::with_capacity(parties.len());
        let mut errors = Vec::new();
        for duty_party in parties {
            let request = IcpRequest::Period {
                duty_party: duty_party.clone(),
                month,
            };
            match self.generate(request).await {
                Ok(report) => {
                    if report.errors.is_empty() {
                        info!(duty_party = %duty_party, file = %report.file_name, "ICP generated");
                    } else {
                        warn!(
                            duty_party = %duty_party,
                            file = %report.file_name,
                            errors = report.errors.len(),
                            "ICP generated with errors"
                        );
                    }
                    reports.push(report);
                }
                Err(e) => {
                    error!(duty_party = %duty_party, error = %e, "ICP generation failed");
                    errors.push(e);
                }
            }
        }

        Ok(Collected {
            value: reports,
            errors,
        })
    }

    /// Generates one file now.
    ///
    /// # Errors
    ///
    /// See [`IcpService::generate_at`].
    pub async fn generate(&self, request: IcpRequest) -> Result<IcpReport, IcpError> {
        self.generate_at(request, Utc::now()).await
    }

    /// Generates one file as of `now`.
    ///
    /// Per-declaration failures, file system failures, and ledger failures are collected in
    /// the report rather than returned.
    ///
    /// # Errors
    ///
    /// Returns [`IcpError::NoDeclarations`] when there is nothing to generate,
    /// [`IcpError::InvalidFileName`] for a malformed append target, or a repository error if
    /// the eligible declarations cannot be listed.
    pub async fn generate_at(
        &self,
        request: IcpRequest,
        now: DateTime<Utc>,
    ) -> Result<IcpReport, IcpError> {
        let (name, customs_ids) = self.plan(request, now).await?;
        let duty_party = name.owner().to_string();
        let month = name.month();
        info!(
            duty_party = %duty_party,
            %month,
            file = %name,
            declarations = customs_ids.len(),
            "Generating ICP file"
        );

        let mut errors = Vec::new();
        let vat_note = self
            .vat_note_archive(&duty_party, month, &customs_ids, &mut errors)
            .await;

        let requested: HashSet<&str> = customs_ids.iter().map(String::as_str).collect();
        let mut rows: Vec<TaxObject> = Vec::new();
        let mut tax_files: Vec<TaxFileObject> = Vec::new();
        let mut pods: Vec<PodFileObject> = Vec::new();
        let mut memberships = Vec::new();

        for (idx, customs_id) in customs_ids.iter().enumerate() {
            info!(idx, customs_id = %customs_id, "Assembling declaration");
            match self.assembler.assemble(customs_id).await {
                Ok(collected) => {
                    let declaration = collected.drain_into(&mut errors);
                    memberships.push(GenerationMembership {
                        icp_name: name.as_str().to_string(),
                        tax_type: declaration.tax_type(),
                        in_excel: requested.contains(declaration.customs_id.as_str()),
                        customs_id: declaration.customs_id,
                    });
                    rows.extend(declaration.rows);
                    tax_files.extend(declaration.tax_file);
                    pods.extend(declaration.pods);
                }
                Err(e) => {
                    warn!(customs_id = %customs_id, error = %e, "Declaration excluded");
                    errors.push(e);
                }
            }
        }

        let path = name.path(&self.settings.save_dir);
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
            period: PeriodKey::new(duty_party.clone(), month),
            name: name.as_str().to_string(),
            total: customs_ids.len() as u64,
            status: written,
            vat_note: vat_note.clone().unwrap_or_default(),
            generated_at: now.naive_utc(),
        };
        if let Err(e) = self.ledger.record(generation).await {
            error!(file = %name, error = %e, "Failed to record generation");
            errors.push(e);
        }
        if let Err(e) = self.ledger.record_memberships(&memberships).await {
            error!(file = %name, error = %e, "Failed to record declarations of file");
            errors.push(e);
        }

        Ok(IcpReport {
            file_name: name.as_str().to_string(),
            path,
            duty_party,
            month,
            declarations: customs_ids.len(),
            rows: rows.len(),
            written,
            vat_note,
            errors,
        })
    }

    /// Resolves the output name and the declarations to include.
    async fn plan(
        &self,
        request: IcpRequest,
        now: DateTime<Utc>,
    ) -> Result<(IcpFileName, Vec<String>), IcpError> {
        match request {
            IcpRequest::Period { duty_party, month } => {
                let ids = self
                    .declarations
                    .eligible_customs_ids(&duty_party, month)
                    .await?;
                if ids.is_empty() {
                    return Err(IcpError::NoDeclarations(format!(
                        "duty party {duty_party} in {month}"
                    )));
                }
                let local = now.with_timezone(&Local).naive_local();
                Ok((IcpFileName::generate(&duty_party, month, &local), ids))
            }
            IcpRequest::Append {
                file_name,
                customs_ids,
            } => {
                let name = IcpFileName::parse(&file_name)?;
                let mut seen = HashSet::new();
                let ids: Vec<String> = customs_ids
                    .into_iter()
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty() && seen.insert(id.clone()))
                    .collect();
                if ids.is_empty() {
                    return Err(IcpError::NoDeclarations(format!("file {file_name}")));
                }
                Ok((name, ids))
            }
        }
    }

    async fn vat_note_archive(
        &self,
        duty_party: &str,
        month: ReportMonth,
        customs_ids: &[String],
        errors: &mut Vec<IcpError>,
    ) -> Option<String> {
        let archiver = self.vat_notes.as_ref()?;
        match self.declarations.needs_vat_note(duty_party).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                errors.push(e);
                return None;
            }
        }

        match archiver.build(month, duty_party, customs_ids).await {
            Ok(archive) => Some(archive.name),
            Err(e) => {
                error!(duty_party, error = %e, "VAT-note archive failed");
                errors.push(e.into());
                None
            }
        }
    }
}

/// Writes the workbook under `save_dir`, collecting failures. Returns whether it reached disk.
pub(crate) async fn write_workbook(
    save_dir: &Path,
    name: &IcpFileName,
    rows: &[TaxObject],
    tax_files: &[TaxFileObject],
    pods: &[PodFileObject],
    errors: &mut Vec<IcpError>,
) -> bool {
    let dir = name.directory(save_dir);
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        errors.push(IcpError::io(&dir, &e));
        return false;
    }
    match IcpWorkbook::new(name, rows, tax_files, pods).save(&name.path(save_dir)) {
        Ok(()) => true,
        Err(e) => {
            errors.push(e.into());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveError;
    use crate::icp::mock::{MockDeclarations, MockGenerations};
    use crate::icp::types::{ProcessCode, TaxQuery};
    use chrono::TimeZone;

    struct StaticDownloader;

    impl Downloader for StaticDownloader {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, ArchiveError> {
            Ok(b"%PDF".to_vec())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 10, 1, 15, 40, 20).unwrap()
    }

    fn month(s: &str) -> ReportMonth {
        ReportMonth::parse(s).unwrap()
    }

    fn settings(dir: &std::path::Path) -> IcpSettings {
        IcpSettings {
            save_dir: dir.to_path_buf(),
            links: ReceiptLinks::new(
                "https://board.test/nl/{customs_id}",
                "https://board.test/be/{customs_id}",
            ),
        }
    }

    fn service(
        repo: MockDeclarations,
        dir: &std::path::Path,
    ) -> (IcpService<MockDeclarations, MockGenerations>, Arc<MockGenerations>) {
        let generations = Arc::new(MockGenerations::default());
        let service = IcpService::new(Arc::new(repo), Arc::clone(&generations), settings(dir));
        (service, generations)
    }

    fn period(duty_party: &str, m: &str) -> IcpRequest {
        IcpRequest::Period {
            duty_party: duty_party.to_string(),
            month: month(m),
        }
    }

    #[tokio::test]
    async fn test_unresolved_declaration_contributes_one_error_and_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockDeclarations::default();
        repo.declaration("C1", "NL001", "NL", &["1", "2"]);
        repo.declaration("C2", "NL001", "NL", &[]);
        repo.eligible
            .insert("NL001".to_string(), vec!["C1".to_string(), "C2".to_string()]);
        let (service, generations) = service(repo, dir.path());

        let report = service
            .generate_at(period("NL001", "2022-09"), now())
            .await
            .unwrap();

        assert_eq!(report.declarations, 2);
        assert_eq!(report.rows, 2);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(&report.errors[0], IcpError::TaxUnresolved(id) if id == "C2"));
        assert!(report.written);
        assert!(report.path.starts_with(dir.path().join("2022").join("09")));
        assert!(report.path.exists());
        assert!(report.file_name.starts_with("NL001_202209_"));

        let records = generations.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total, 2);
        assert_eq!((records[0].year, records[0].month), (2022, 9));
        assert!(records[0].is_newest && records[0].status);
        assert_eq!(records[0].generated_at, now().naive_utc());

        let memberships = generations.memberships();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].customs_id, "C1");
        assert_eq!(memberships[0].tax_type, 4);
        assert!(memberships[0].in_excel);
    }

    #[tokio::test]
    async fn test_only_eligible_declarations_are_included() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockDeclarations::default();
        repo.declaration("M1", "NL001", "NL", &["1"]);
        repo.declaration("M1-CHILD", "NL001", "NL", &["1"]);
        repo.eligible.insert("NL001".to_string(), vec!["M1".to_string()]);
        let (service, generations) = service(repo, dir.path());

        let report = service
            .generate_at(period("NL001", "2022-09"), now())
            .await
            .unwrap();

        assert_eq!(report.rows, 1);
        let ids: Vec<_> = generations
            .memberships()
            .into_iter()
            .map(|m| m.customs_id)
            .collect();
        assert_eq!(ids, vec!["M1"]);
    }

    #[tokio::test]
    async fn test_append_uses_month_and_owner_from_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockDeclarations::default();
        repo.declaration("C1", "NL001", "NL", &["1"]);
        repo.tax_rows(
            TaxQuery::NonEu,
            "C9",
            ProcessCode::TmpTax,
            vec![crate::icp::mock::line("1", "A00", "TMP_TAX")],
        );
        let (service, generations) = service(repo, dir.path());

        let request = IcpRequest::Append {
            file_name: "NL001_202208_01000000.xlsx".to_string(),
            customs_ids: vec!["C1".to_string(), "C9".to_string(), "C1".to_string()],
        };
        let report = service.generate_at(request, now()).await.unwrap();

        assert_eq!(report.file_name, "NL001_202208_01000000.xlsx");
        assert_eq!(
            report.path,
            dir.path().join("2022/08/NL001_202208_01000000.xlsx")
        );
        assert_eq!(report.declarations, 2);
        assert_eq!(report.rows, 2);

        let records = generations.records();
        assert_eq!(records[0].duty_party, "NL001");
        assert_eq!((records[0].year, records[0].month), (2022, 8));
        let tax_types: Vec<_> = generations
            .memberships()
            .into_iter()
            .map(|m| m.tax_type)
            .collect();
        assert_eq!(tax_types, vec![4, 115]);
    }

    #[tokio::test]
    async fn test_append_rejects_malformed_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let (service, generations) = service(MockDeclarations::default(), dir.path());

        let request = IcpRequest::Append {
            file_name: "report.xlsx".to_string(),
            customs_ids: vec!["C1".to_string()],
        };
        let err = service.generate_at(request, now()).await.unwrap_err();
        assert!(matches!(err, IcpError::InvalidFileName(_)));
        assert!(generations.records().is_empty());
    }

    #[tokio::test]
    async fn test_no_declarations_halts_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let (service, generations) = service(MockDeclarations::default(), dir.path());

        let err = service
            .generate_at(period("NL001", "2022-09"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, IcpError::NoDeclarations(_)));
        assert!(generations.records().is_empty());
        assert!(!dir.path().join("2022").exists());
    }

    #[tokio::test]
    async fn test_regeneration_supersedes_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockDeclarations::default();
        repo.declaration("C1", "NL001", "NL", &["1"]);
        repo.eligible.insert("NL001".to_string(), vec!["C1".to_string()]);
        let (service, generations) = service(repo, dir.path());

        service
            .generate_at(period("NL001", "2022-09"), now())
            .await
            .unwrap();
        service
            .generate_at(period("NL001", "2022-09"), now() + chrono::Duration::minutes(5))
            .await
            .unwrap();

        let records = generations.records();
        assert_eq!(records.len(), 2);
        assert!(!records[0].is_newest);
        assert!(records[1].is_newest);
    }

    #[tokio::test]
    async fn test_monthly_without_duty_parties() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(MockDeclarations::default(), dir.path());

        let err = service.generate_monthly(month("2022-09")).await.unwrap_err();
        assert!(matches!(err, IcpError::NoDutyParties(m) if m == "2022-09"));
    }

    #[tokio::test]
    async fn test_monthly_continues_past_failed_party() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockDeclarations::default();
        repo.duty_parties = vec!["NL001".to_string(), "BE002".to_string()];
        repo.declaration("C1", "NL001", "NL", &["1"]);
        repo.eligible.insert("NL001".to_string(), vec!["C1".to_string()]);
        let (service, generations) = service(repo, dir.path());

        let collected = service.generate_monthly(month("2022-09")).await.unwrap();

        assert_eq!(collected.value.len(), 1);
        assert_eq!(collected.value[0].duty_party, "NL001");
        assert_eq!(collected.errors.len(), 1);
        assert!(matches!(collected.errors[0], IcpError::NoDeclarations(_)));
        assert_eq!(generations.records().len(), 1);
    }

    #[tokio::test]
    async fn test_vat_note_archive_recorded_for_parties_that_need_it() {
        let dir = tempfile::tempdir().unwrap();
        let notes = tempfile::tempdir().unwrap();
        let mut repo = MockDeclarations::default();
        repo.declaration("C1", "NL001", "NL", &["1"]);
        repo.declaration("C2", "BE002", "BE", &["1"]);
        repo.eligible.insert("NL001".to_string(), vec!["C1".to_string()]);
        repo.eligible.insert("BE002".to_string(), vec!["C2".to_string()]);
        repo.vat_note_parties.insert("NL001".to_string());
        let (service, generations) = service(repo, dir.path());
        let service = service.with_vat_notes(VatNoteArchiver::new(
            StaticDownloader,
            notes.path(),
            "https://docs.test/CUSTOMS_ID/FILE_TYPE",
        ));

        let with_note = service
            .generate_at(period("NL001", "2022-09"), now())
            .await
            .unwrap();
        let without_note = service
            .generate_at(period("BE002", "2022-09"), now())
            .await
            .unwrap();

        assert_eq!(
            with_note.vat_note.as_deref(),
            Some("2022-09-NL001-vatnote.zip")
        );
        assert!(notes.path().join("2022/2022-09-NL001-vatnote.zip").exists());
        assert!(without_note.vat_note.is_none());

        let records = generations.records();
        assert_eq!(records[0].vat_note, "2022-09-NL001-vatnote.zip");
        assert_eq!(records[1].vat_note, "");
    }
}

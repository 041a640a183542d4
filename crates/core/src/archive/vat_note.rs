//! VAT-note and transfer document downloads.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use icp_shared::ReportMonth;
use icp_shared::config::VatNoteConfig;
use tracing::{info, warn};

use super::compress::zip_dir;
use super::error::ArchiveError;
use crate::icp::vat_note_archive_name;

const CUSTOMS_ID_TOKEN: &str = "CUSTOMS_ID";
const FILE_TYPE_TOKEN: &str = "FILE_TYPE";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetches a document body.
pub trait Downloader: Send + Sync {
    /// Download `url` fully.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ArchiveError>> + Send;
}

/// `reqwest` backed downloader.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    /// Client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, ArchiveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArchiveError::download("client", e))?;
        Ok(Self { client })
    }
}

impl VatNoteArchiver<HttpDownloader> {
    /// Archiver over HTTP, or `None` when archives are disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &VatNoteConfig) -> Result<Option<Self>, ArchiveError> {
        if !config.enabled {
            return Ok(None);
        }
        let downloader = HttpDownloader::new(DOWNLOAD_TIMEOUT)?;
        Ok(Some(Self::new(
            downloader,
            &config.dir,
            &config.download_uri,
        )))
    }
}

impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ArchiveError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ArchiveError::download(url, e))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ArchiveError::download(url, e))?;
        Ok(body.to_vec())
    }
}

/// Documents fetched per declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VatDocument {
    /// VAT note.
    VatNote,
    /// Transfer document.
    TransferDoc,
}

impl VatDocument {
    /// Both documents, in download order.
    pub const ALL: [Self; 2] = [Self::VatNote, Self::TransferDoc];

    /// Value substituted for `FILE_TYPE`.
    #[must_use]
    pub const fn file_type(self) -> &'static str {
        match self {
            Self::VatNote => "vatNote",
            Self::TransferDoc => "transferDoc",
        }
    }

    /// Subdirectory of the month directory.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::VatNote => "vat-note",
            Self::TransferDoc => "transfer-doc",
        }
    }

    /// Local file name for a declaration.
    #[must_use]
    pub fn file_name(self, customs_id: &str) -> String {
        match self {
            Self::VatNote => format!("{customs_id}_vat_note.pdf"),
            Self::TransferDoc => format!("{customs_id}_transfer_doc.pdf"),
        }
    }

    /// Fill the download template for a declaration.
    #[must_use]
    pub fn url(self, template: &str, customs_id: &str) -> String {
        template
            .replace(CUSTOMS_ID_TOKEN, customs_id)
            .replace(FILE_TYPE_TOKEN, self.file_type())
    }
}

/// A built archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VatNoteArchive {
    /// Archive file name, stored on the generation record.
    pub name: String,
    /// Archive location.
    pub path: PathBuf,
    /// Documents that were downloaded.
    pub downloaded: usize,
    /// Documents that could not be downloaded.
    pub skipped: usize,
}

/// Downloads the documents of a batch and zips them.
///
/// Layout under `root`:
///
/// ```text
/// {YYYY}/{YYYY-MM}/vat-note/{id}_vat_note.pdf
/// {YYYY}/{YYYY-MM}/transfer-doc/{id}_transfer_doc.pdf
/// {YYYY}/{YYYY-MM}-{duty}-vatnote.zip
/// ```
pub struct VatNoteArchiver<D: Downloader> {
    downloader: D,
    root: PathBuf,
    template: String,
}

impl<D: Downloader> VatNoteArchiver<D> {
    /// Create a new archiver.
    #[must_use]
    pub fn new(downloader: D, root: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            downloader,
            root: root.into(),
            template: template.into(),
        }
    }

    /// Month directory the documents are downloaded into.
    #[must_use]
    pub fn download_dir(&self, month: ReportMonth) -> PathBuf {
        self.year_dir(month).join(month.to_string())
    }

    fn year_dir(&self, month: ReportMonth) -> PathBuf {
        self.root.join(format!("{:04}", month.year()))
    }

    /// Download every document and zip the month directory.
    ///
    /// Individual download failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be prepared or the zip cannot be written.
    pub async fn build(
        &self,
        month: ReportMonth,
        duty_party: &str,
        customs_ids: &[String],
    ) -> Result<VatNoteArchive, ArchiveError> {
        let download_dir = self.download_dir(month);
        prepare(&download_dir).await?;

        let mut downloaded = 0;
        let mut skipped = 0;
        for (idx, customs_id) in customs_ids.iter().enumerate() {
            for document in VatDocument::ALL {
                let url = document.url(&self.template, customs_id);
                let dest = download_dir
                    .join(document.dir_name())
                    .join(document.file_name(customs_id));
                match self.save(&url, &dest).await {
                    Ok(()) => downloaded += 1,
                    Err(e) => {
                        warn!(idx, customs_id = %customs_id, error = %e, "Document download skipped");
                        skipped += 1;
                    }
                }
            }
        }

        let name = vat_note_archive_name(month, duty_party);
        let path = self.year_dir(month).join(&name);
        let files = zip_dir(&download_dir, &path)?;
        info!(
            path = %path.display(),
            files,
            skipped,
            "Built VAT-note archive"
        );

        Ok(VatNoteArchive {
            name,
            path,
            downloaded,
            skipped,
        })
    }

    async fn save(&self, url: &str, dest: &Path) -> Result<(), ArchiveError> {
        let body = self.downloader.fetch(url).await?;
        tokio::fs::write(dest, body)
            .await
            .map_err(|e| ArchiveError::io(dest, &e))
    }
}

/// Empty the month directory and recreate its document subdirectories.
async fn prepare(download_dir: &Path) -> Result<(), ArchiveError> {
    if tokio::fs::try_exists(download_dir).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(download_dir)
            .await
            .map_err(|e| ArchiveError::io(download_dir, &e))?;
    }
    for document in VatDocument::ALL {
        let dir = download_dir.join(document.dir_name());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ArchiveError::io(&dir, &e))?;
    }
    Ok(())
}

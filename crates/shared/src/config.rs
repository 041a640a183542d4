//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// ICP workbook output.
    pub icp: IcpConfig,
    /// VAT-note archive packaging.
    #[serde(default)]
    pub vat_note: VatNoteConfig,
    /// Object storage holding price screenshots.
    #[serde(default)]
    pub oss: Option<OssConfig>,
    /// Audit workbook output.
    pub audit: AuditConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`mysql://...`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// ICP generation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct IcpConfig {
    /// Root directory for generated workbooks; files land in `{save_dir}/{YYYY}/{MM}/`.
    #[serde(default)]
    pub save_dir: PathBuf,
    /// Tax receipt link for NL declarations. `{customs_id}` is substituted.
    #[serde(default = "default_nl_receipt_url")]
    pub tax_receipt_nl_url: String,
    /// Tax receipt link for BE declarations. `{customs_id}` is substituted.
    #[serde(default = "default_be_receipt_url")]
    pub tax_receipt_be_url: String,
}

fn default_nl_receipt_url() -> String {
    "https://board.example.com/declarefile/-1/18-{customs_id}".to_string()
}

fn default_be_receipt_url() -> String {
    "https://board.example.com/declarefile-be?customsId={customs_id}&statusCode=09".to_string()
}

/// VAT-note archive settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VatNoteConfig {
    /// Whether archives are built at all.
    #[serde(default)]
    pub enabled: bool,
    /// Root directory for downloads and archives.
    #[serde(default)]
    pub dir: PathBuf,
    /// Download URI template with `CUSTOMS_ID` and `FILE_TYPE` placeholders.
    #[serde(default)]
    pub download_uri: String,
}

/// Aliyun OSS credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct OssConfig {
    /// OSS endpoint URL.
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Access key secret.
    pub access_key_secret: String,
}

/// Audit workbook settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Directory the `{YYYY-MM}.xlsx` workbook is written to.
    #[serde(default)]
    pub save_dir: PathBuf,
    /// Scratch directory for downloaded screenshots.
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,
}

fn default_tmp_dir() -> PathBuf {
    std::env::temp_dir().join("icp-audit")
}

/// A required setting is missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required setting: {0}")]
pub struct MissingSetting(pub &'static str);

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("ICP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Checks the settings every run depends on.
    ///
    /// Generation cannot proceed without somewhere to write its output, so callers treat
    /// an error here as fatal.
    pub fn validate(&self) -> Result<(), MissingSetting> {
        if self.database.url.trim().is_empty() {
            return Err(MissingSetting("database.url"));
        }
        if self.icp.save_dir.as_os_str().is_empty() {
            return Err(MissingSetting("icp.save_dir"));
        }
        if self.audit.save_dir.as_os_str().is_empty() {
            return Err(MissingSetting("audit.save_dir"));
        }
        if self.vat_note.enabled
            && (self.vat_note.dir.as_os_str().is_empty() || self.vat_note.download_uri.is_empty())
        {
            return Err(MissingSetting("vat_note.dir / vat_note.download_uri"));
        }
        Ok(())
    }
}

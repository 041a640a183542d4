//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Aliyun Object Storage Service
    Oss {
        /// OSS endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Access key secret.
        access_key_secret: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create an Aliyun OSS provider.
    #[must_use]
    pub fn oss(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Self {
        Self::Oss {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Provider name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Oss { .. } => "oss",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::Oss { bucket, .. } => bucket,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
}

impl StorageConfig {
    /// Create a new storage config.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self { provider }
    }
}

impl From<&icp_shared::config::OssConfig> for StorageConfig {
    fn from(oss: &icp_shared::config::OssConfig) -> Self {
        Self::new(StorageProvider::oss(
            &oss.endpoint,
            &oss.bucket,
            &oss.access_key_id,
            &oss.access_key_secret,
        ))
    }
}

//! Storage service implementation using Apache OpenDAL.

use std::path::Path;

use opendal::{Operator, services};
use tracing::debug;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Read access to stored screenshots.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::Oss {
                endpoint,
                bucket,
                access_key_id,
                access_key_secret,
            } => {
                let builder = services::Oss::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .access_key_secret(access_key_secret);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Read an object fully into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or cannot be read.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let key = normalize_key(key);
        let buffer = self.operator.read(key).await.map_err(StorageError::from)?;
        Ok(buffer.to_vec())
    }

    /// Download an object to a local file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or the local write fails.
    pub async fn download_to(&self, key: &str, dest: &Path) -> Result<u64, StorageError> {
        let bytes = self.read(key).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::local_write(parent, &e))?;
        }
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| StorageError::local_write(dest, &e))?;

        debug!(
            provider = self.provider_name(),
            bucket = self.config.provider.bucket(),
            key,
            path = %dest.display(),
            bytes = bytes.len(),
            "Downloaded object"
        );
        Ok(bytes.len() as u64)
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }
}

/// Keys are stored with a leading slash in some records; OpenDAL wants them relative.
fn normalize_key(key: &str) -> &str {
    key.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(root: &Path) -> StorageService {
        StorageService::from_config(StorageConfig::new(StorageProvider::local_fs(root)))
            .expect("should create service")
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("/price/a.png"), "price/a.png");
        assert_eq!(normalize_key("price/a.png"), "price/a.png");
    }

    #[tokio::test]
    async fn test_download_to_local_file() {
        let store = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(store.path().join("price")).unwrap();
        std::fs::write(store.path().join("price/a.png"), b"png-bytes").unwrap();
        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("nested/a.png");

        let service = local(store.path());
        assert_eq!(service.read("/price/a.png").await.unwrap(), b"png-bytes");
        let written = service.download_to("/price/a.png", &dest).await.unwrap();

        assert_eq!(written, 9);
        assert_eq!(std::fs::read(&dest).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let store = tempfile::tempdir().unwrap();
        let service = local(store.path());

        let err = service.read("missing.png").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}

use crate::traits::{StorageError, StorageResult};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Directory of statically served assets (filesystem thumbnail strategy).
#[derive(Clone, Debug)]
pub struct LocalAssetStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalAssetStore {
    /// Create a new LocalAssetStore, creating the directory if needed.
    ///
    /// # Arguments
    /// * `base_path` - Root directory for assets (e.g., "./assets")
    /// * `base_url` - URL the directory is served under (e.g., "http://localhost:8091/assets")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create assets directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalAssetStore {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve an asset name to a path inside the base directory.
    ///
    /// Names are flat: separators and `..` are rejected.
    pub fn path_for(&self, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Asset name contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(name))
    }

    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Write `data` as `name` and return its public URL.
    ///
    /// The bytes go to a sibling temp file that is renamed into place, so a
    /// reader never observes a partially written asset.
    pub async fn write(&self, name: &str, data: Bytes) -> StorageResult<String> {
        let path = self.path_for(name)?;
        let partial = self.base_path.join(format!(".{}.partial", name));
        let size = data.len() as u64;

        let written = async {
            let mut file = fs::File::create(&partial).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            fs::rename(&partial, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&partial).await;
            tracing::error!(
                error = %e,
                path = %path.display(),
                size_bytes = size,
                "Asset write failed"
            );
            return Err(StorageError::IoError(e));
        }

        tracing::info!(
            path = %path.display(),
            size_bytes = size,
            "Asset written"
        );

        Ok(self.url_for(name))
    }

    pub async fn exists(&self, name: &str) -> StorageResult<bool> {
        let path = self.path_for(name)?;
        Ok(fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_returns_served_url() {
        let dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(dir.path(), "http://localhost:8091/assets/".to_string())
            .await
            .unwrap();

        let url = store
            .write("abc.png", Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:8091/assets/abc.png");
        assert_eq!(std::fs::read(dir.path().join("abc.png")).unwrap(), b"\x89PNG");
        assert!(!dir.path().join(".abc.png.partial").exists());
        assert!(store.exists("abc.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(dir.path(), "http://localhost/assets".to_string())
            .await
            .unwrap();

        for name in ["../escape.png", "nested/a.png", "", "..", "a\\b.png"] {
            assert!(matches!(
                store.path_for(name),
                Err(StorageError::InvalidKey(_))
            ));
        }
    }
}

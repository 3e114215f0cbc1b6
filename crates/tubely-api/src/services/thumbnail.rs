//! Where thumbnail bytes end up, selected by `THUMBNAIL_STRATEGY`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use std::sync::Arc;
use tubely_core::models::StoredReference;
use tubely_core::{AppError, PipelineStage, ThumbnailStrategy};
use tubely_storage::{derive_asset_name, LocalAssetStore, ObjectStorage, THUMBNAIL_PREFIX};

#[derive(Clone)]
pub enum ThumbnailStore {
    /// Embed the bytes in the record as a `data:` URL.
    Inline,
    /// Write into the served assets directory and reference the static URL.
    Filesystem(LocalAssetStore),
    /// Upload under `thumbnails/` and reference `bucket,key`.
    ObjectStore(Arc<dyn ObjectStorage>),
}

impl ThumbnailStore {
    pub fn strategy(&self) -> ThumbnailStrategy {
        match self {
            ThumbnailStore::Inline => ThumbnailStrategy::Inline,
            ThumbnailStore::Filesystem(_) => ThumbnailStrategy::Filesystem,
            ThumbnailStore::ObjectStore(_) => ThumbnailStrategy::ObjectStore,
        }
    }

    /// Persist `data` and return the reference to record.
    pub async fn store(&self, data: Bytes, content_type: &str) -> Result<StoredReference, AppError> {
        match self {
            ThumbnailStore::Inline => Ok(StoredReference::Inline(data_url(content_type, &data))),
            ThumbnailStore::Filesystem(assets) => {
                let name = derive_asset_name(None, content_type)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                let url = assets
                    .write(name.as_str(), data)
                    .await
                    .map_err(|e| AppError::processing(PipelineStage::AssetWrite, e))?;
                Ok(StoredReference::Url(url))
            }
            ThumbnailStore::ObjectStore(storage) => {
                let key = derive_asset_name(Some(THUMBNAIL_PREFIX), content_type)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                let artifact = storage
                    .put_object(storage.default_bucket(), key.as_str(), data, content_type)
                    .await
                    .map_err(|e| AppError::processing(PipelineStage::Upload, e))?;
                Ok(artifact.reference())
            }
        }
    }
}

fn data_url(content_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tubely_storage::MemoryStorage;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    #[tokio::test]
    async fn test_inline_round_trips() {
        let reference = ThumbnailStore::Inline
            .store(Bytes::from_static(PNG), "image/png")
            .await
            .unwrap();
        let StoredReference::Inline(url) = reference else {
            panic!("expected inline reference");
        };
        let encoded = url.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), PNG);
    }

    #[tokio::test]
    async fn test_filesystem_writes_served_asset() {
        let dir = TempDir::new().unwrap();
        let assets = LocalAssetStore::new(dir.path(), "http://localhost:8091/assets".to_string())
            .await
            .unwrap();
        let reference = ThumbnailStore::Filesystem(assets)
            .store(Bytes::from_static(PNG), "image/png")
            .await
            .unwrap();

        let StoredReference::Url(url) = reference else {
            panic!("expected url reference");
        };
        let name = url.strip_prefix("http://localhost:8091/assets/").unwrap();
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), PNG);
    }

    #[tokio::test]
    async fn test_object_store_uses_thumbnail_prefix() {
        let storage = Arc::new(MemoryStorage::new("tubely"));
        let reference = ThumbnailStore::ObjectStore(storage.clone())
            .store(Bytes::from_static(PNG), "image/jpeg")
            .await
            .unwrap();

        let StoredReference::Object { bucket, key } = reference else {
            panic!("expected object reference");
        };
        assert_eq!(bucket, "tubely");
        assert!(key.starts_with("thumbnails/"));
        assert!(key.ends_with(".jpg"));
        let stored = storage.get_object(&bucket, &key).await.unwrap();
        assert_eq!(stored.data.as_ref(), PNG);
    }

    #[tokio::test]
    async fn test_object_store_failure_is_upload_stage() {
        let storage = Arc::new(MemoryStorage::new("tubely"));
        storage.fail_uploads(true);
        let err = ThumbnailStore::ObjectStore(storage)
            .store(Bytes::from_static(PNG), "image/png")
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Upload));
    }
}

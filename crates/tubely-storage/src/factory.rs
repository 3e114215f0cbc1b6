use crate::memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{ObjectStorage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use tubely_core::Config;

/// Create a blob store backend based on configuration
pub fn create_storage(config: &Config) -> StorageResult<Arc<dyn ObjectStorage>> {
    let bucket = config.s3_bucket().to_string();
    if bucket.trim().is_empty() {
        return Err(StorageError::ConfigError("S3_BUCKET not configured".to_string()));
    }

    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config.s3_region().to_string();
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(bucket, region, endpoint)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        StorageBackend::Memory => {
            tracing::warn!(bucket = %bucket, "Using in-memory blob store; uploads are not durable");
            Ok(Arc::new(MemoryStorage::new(bucket)))
        }
    }
}

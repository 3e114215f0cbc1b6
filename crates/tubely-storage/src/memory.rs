//! In-memory blob store for tests and local development.
//!
//! Backed by `object_store::memory::InMemory`, one instance per bucket. Signed
//! URLs are not real S3 signatures; they carry the bucket, key and expiry so
//! callers can tell them apart from public URLs.

use crate::object;
use crate::traits::{ObjectStorage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tubely_core::models::StoredArtifact;

const MEMORY_BASE_URL: &str = "http://localhost:9000";

#[derive(Default)]
struct FailureSwitches {
    uploads: AtomicBool,
    signing: AtomicBool,
}

pub struct MemoryStorage {
    buckets: Mutex<HashMap<String, Arc<InMemory>>>,
    bucket: String,
    puts: AtomicUsize,
    fail: FailureSwitches,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            bucket: bucket.into(),
            puts: AtomicUsize::new(0),
            fail: FailureSwitches::default(),
        }
    }

    /// Make subsequent `put_object` calls fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail.uploads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `presigned_get_url` calls fail.
    pub fn fail_signing(&self, fail: bool) {
        self.fail.signing.store(fail, Ordering::SeqCst);
    }

    /// Number of successful puts across all buckets.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn store(&self, bucket: &str) -> StorageResult<Arc<InMemory>> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| StorageError::BackendError("memory store poisoned".to_string()))?;

        Ok(Arc::clone(
            buckets
                .entry(bucket.to_string())
                .or_insert_with(|| Arc::new(InMemory::new())),
        ))
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    fn default_bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<StoredArtifact> {
        let location = object::location(key)?;
        if self.fail.uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(format!(
                "simulated upload failure for {}/{}",
                bucket, key
            )));
        }

        let store = self.store(bucket)?;
        let size = data.len() as u64;

        object::put_with_content_type(store.as_ref(), &location, data, content_type)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        self.puts.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            "Memory upload successful"
        );

        Ok(StoredArtifact {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
        })
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        object::location(key)?;
        if self.fail.signing.load(Ordering::SeqCst) {
            return Err(StorageError::SigningFailed(
                "simulated signing failure".to_string(),
            ));
        }

        let expires_at = SystemTime::now()
            .checked_add(expires_in)
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .ok_or_else(|| StorageError::SigningFailed("expiry out of range".to_string()))?;

        Ok(format!(
            "{}?X-Amz-Expires={}&X-Tubely-Expires-At={}",
            self.public_url(bucket, key),
            expires_in.as_secs(),
            expires_at
        ))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", MEMORY_BASE_URL, bucket, key)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        let store = self.store(bucket)?;
        object::get(store.as_ref(), key).await
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let store = self.store(bucket)?;
        object::exists(store.as_ref(), key).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let store = self.store(bucket)?;
        object::delete(store.as_ref(), key).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_keeps_content_type() {
        let storage = MemoryStorage::new("tubely");
        let artifact = storage
            .put_object(
                "tubely",
                "landscape/abc.mp4",
                Bytes::from_static(b"mp4-bytes"),
                "video/mp4",
            )
            .await
            .unwrap();

        assert_eq!(artifact.bucket, "tubely");
        assert_eq!(artifact.key, "landscape/abc.mp4");

        let stored = storage.get_object("tubely", "landscape/abc.mp4").await.unwrap();
        assert_eq!(stored.data.as_ref(), b"mp4-bytes");
        assert_eq!(stored.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(storage.put_count(), 1);
    }

    #[tokio::test]
    async fn test_buckets_are_isolated() {
        let storage = MemoryStorage::new("tubely");
        storage
            .put_object("a", "k.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap();

        assert!(storage.exists("a", "k.png").await.unwrap());
        assert!(!storage.exists("b", "k.png").await.unwrap());

        storage.delete("a", "k.png").await.unwrap();
        assert!(!storage.exists("a", "k.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_simulated_failures() {
        let storage = MemoryStorage::new("tubely");
        storage.fail_uploads(true);
        let err = storage
            .put_object("tubely", "k.mp4", Bytes::new(), "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(_)));
        assert_eq!(storage.put_count(), 0);

        storage.fail_signing(true);
        let err = storage
            .presigned_get_url("tubely", "k.mp4", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::SigningFailed(_)));
    }

    #[tokio::test]
    async fn test_signed_url_carries_expiry() {
        let storage = MemoryStorage::new("tubely");
        let url = storage
            .presigned_get_url("tubely", "portrait/t.mp4", Duration::from_secs(600))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/tubely/portrait/t.mp4?"));
        assert!(url.contains("X-Amz-Expires=600"));
    }
}

//! Storage abstraction trait
//!
//! This module defines the ObjectStorage trait that blob store backends implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;
use tubely_core::models::StoredArtifact;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("URL signing failed: {0}")]
    SigningFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An object read back from the store.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// Blob store client.
///
/// Every operation names its bucket explicitly since persisted references carry
/// their own bucket (`bucket,key`). Writes are a single atomic put: an object is
/// either fully present under its key or absent.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Bucket new uploads go to.
    fn default_bucket(&self) -> &str;

    /// Store `data` under `bucket/key` with the given content type.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<StoredArtifact>;

    /// Time-limited GET URL for an object. Nothing is persisted.
    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Plain, unsigned object URL.
    fn public_url(&self, bucket: &str, key: &str) -> String;

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject>;

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

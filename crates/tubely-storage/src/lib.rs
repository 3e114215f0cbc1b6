//! Tubely Storage Library
//!
//! Blob store abstraction used by the ingestion pipeline, plus the local asset
//! directory used for filesystem thumbnails.
//!
//! # Storage key format
//!
//! Video keys are `{aspect_class}/{token}.{ext}`, thumbnails uploaded to the blob
//! store are `thumbnails/{token}.{ext}`. Tokens are 22-character URL-safe base64
//! strings with no padding. Key generation lives in the `keys` module so every
//! caller produces the same layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
mod object;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{derive_asset_name, derive_key, extension_for, StorageKey, THUMBNAIL_PREFIX};
#[cfg(feature = "storage-local")]
pub use local::LocalAssetStore;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectStorage, StorageError, StorageResult, StoredObject};
pub use tubely_core::StorageBackend;

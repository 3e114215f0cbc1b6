use crate::object;
use crate::traits::{ObjectStorage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::signer::Signer;
use object_store::Result as ObjectResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tubely_core::models::StoredArtifact;

/// S3 storage implementation
///
/// One `AmazonS3` client is built per bucket on first use and cached, since
/// stored references may point at buckets other than the default one.
pub struct S3Storage {
    clients: Mutex<HashMap<String, Arc<AmazonS3>>>,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - Default bucket for new uploads
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let storage = S3Storage {
            clients: Mutex::new(HashMap::new()),
            bucket,
            region,
            endpoint_url,
        };
        // Builder errors surface here instead of on the first upload.
        storage.client(&storage.bucket)?;
        Ok(storage)
    }

    fn build_client(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    fn client(&self, bucket: &str) -> StorageResult<Arc<AmazonS3>> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| StorageError::BackendError("S3 client cache poisoned".to_string()))?;

        if let Some(client) = clients.get(bucket) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(self.build_client(bucket)?);
        clients.insert(bucket.to_string(), Arc::clone(&client));
        Ok(client)
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path style on the endpoint URL
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, bucket, key)
        } else {
            format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key)
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
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
        let client = self.client(bucket)?;
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> =
            object::put_with_content_type(client.as_ref(), &location, data, content_type).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
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
        let location = object::location(key)?;
        let client = self.client(bucket)?;

        let url_result: ObjectResult<_> = client
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    "S3 URL signing failed"
                );
                StorageError::SigningFailed(e.to_string())
            })?
            .to_string();

        Ok(url)
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.generate_url(bucket, key)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        let client = self.client(bucket)?;
        object::get(client.as_ref(), key).await
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let client = self.client(bucket)?;
        object::exists(client.as_ref(), key).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let client = self.client(bucket)?;

        object::delete(client.as_ref(), key).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            e
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_formats() {
        let aws = S3Storage {
            clients: Mutex::new(HashMap::new()),
            bucket: "tubely".to_string(),
            region: "us-east-2".to_string(),
            endpoint_url: None,
        };
        assert_eq!(
            aws.public_url("tubely", "landscape/abc.mp4"),
            "https://tubely.s3.us-east-2.amazonaws.com/landscape/abc.mp4"
        );

        let minio = S3Storage {
            clients: Mutex::new(HashMap::new()),
            bucket: "tubely".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: Some("http://localhost:9000/".to_string()),
        };
        assert_eq!(
            minio.public_url("other", "portrait/x.mp4"),
            "http://localhost:9000/other/portrait/x.mp4"
        );
    }
}

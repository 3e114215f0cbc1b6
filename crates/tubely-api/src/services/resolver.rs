//! Read-time resolution of stored references into client-usable URLs.
//!
//! Only `bucket,key` is persisted for blob store objects, so signed URLs are
//! minted per read and never go stale in the database.

use std::sync::Arc;
use std::time::Duration;
use tubely_core::models::{StoredReference, Video, VideoResponse};
use tubely_core::{AppError, PipelineStage, VideoUrlMode};
use tubely_storage::ObjectStorage;

#[derive(Clone)]
pub struct ReferenceResolver {
    storage: Arc<dyn ObjectStorage>,
    mode: VideoUrlMode,
    cdn_base_url: Option<String>,
    ttl: Duration,
}

impl ReferenceResolver {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        mode: VideoUrlMode,
        cdn_base_url: Option<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            storage,
            mode,
            cdn_base_url: cdn_base_url.map(|url| url.trim_end_matches('/').to_string()),
            ttl,
        }
    }

    pub fn mode(&self) -> VideoUrlMode {
        self.mode
    }

    /// Turn one persisted reference into a URL.
    pub async fn resolve_reference(&self, reference: &StoredReference) -> Result<String, AppError> {
        let (bucket, key) = match reference {
            StoredReference::Inline(data_url) => return Ok(data_url.clone()),
            StoredReference::Url(url) => return Ok(url.clone()),
            StoredReference::Object { bucket, key } => (bucket, key),
        };

        match self.mode {
            VideoUrlMode::Signed => self
                .storage
                .presigned_get_url(bucket, key, self.ttl)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, bucket = %bucket, key = %key, "Failed to sign object URL");
                    AppError::processing(PipelineStage::Sign, e)
                }),
            VideoUrlMode::Cdn => match self.cdn_base_url {
                Some(ref base) => Ok(format!("{}/{}", base, key)),
                None => Err(AppError::Internal(
                    "CDN URL mode requires CDN_BASE_URL".to_string(),
                )),
            },
            VideoUrlMode::Direct => Ok(self.storage.public_url(bucket, key)),
        }
    }

    async fn resolve_field(&self, raw: Option<&str>) -> Result<Option<String>, AppError> {
        match raw {
            Some(raw) => Ok(Some(
                self.resolve_reference(&StoredReference::parse(raw)).await?,
            )),
            None => Ok(None),
        }
    }

    /// The record as clients see it.
    pub async fn resolve(&self, video: Video) -> Result<VideoResponse, AppError> {
        let thumbnail_url = self.resolve_field(video.thumbnail_url.as_deref()).await?;
        let video_url = self.resolve_field(video.video_url.as_deref()).await?;

        Ok(VideoResponse {
            id: video.id,
            user_id: video.user_id,
            title: video.title,
            description: video.description,
            thumbnail_url,
            video_url,
            created_at: video.created_at,
            updated_at: video.updated_at,
        })
    }

    pub async fn resolve_all(&self, videos: Vec<Video>) -> Result<Vec<VideoResponse>, AppError> {
        let mut resolved = Vec::with_capacity(videos.len());
        for video in videos {
            resolved.push(self.resolve(video).await?);
        }
        Ok(resolved)
    }
}

//! Ingestion orchestrator
//!
//! Sequences one upload end to end:
//!
//! ```text
//! validate type -> check owner -> stage -> probe -> normalize -> read -> key -> upload -> set reference
//! ```
//!
//! Thumbnails skip the tool steps: the bounded body is read into memory and
//! handed to the configured [`ThumbnailStore`].
//!
//! Steps run strictly in order and nothing is retried. The record is written
//! only after the artifact is stored, and only the targeted reference column
//! changes, so concurrent uploads of the other kind are never overwritten.
//! Every staged file is owned by a drop guard so it is gone by the time this
//! returns (or the future is dropped).

use crate::services::thumbnail::ThumbnailStore;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;
use tubely_core::models::{MediaKind, StoredReference, Video};
use tubely_core::{AppError, PipelineStage};
use tubely_db::VideoRepository;
use tubely_processing::{
    read_bounded, validate_content_type, MediaInspector, MediaNormalizer, StagingStore,
};
use tubely_storage::{derive_key, ObjectStorage};
use uuid::Uuid;

/// One upload as received by a handler.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub kind: MediaKind,
    /// Content-Type header of the multipart field, unparsed.
    pub declared_content_type: String,
    pub size_limit: u64,
}

#[derive(Clone)]
pub struct IngestService {
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn ObjectStorage>,
    inspector: Arc<dyn MediaInspector>,
    normalizer: Arc<dyn MediaNormalizer>,
    staging: StagingStore,
    thumbnails: ThumbnailStore,
}

impl IngestService {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn ObjectStorage>,
        inspector: Arc<dyn MediaInspector>,
        normalizer: Arc<dyn MediaNormalizer>,
        staging: StagingStore,
        thumbnails: ThumbnailStore,
    ) -> Self {
        Self {
            videos,
            storage,
            inspector,
            normalizer,
            staging,
            thumbnails,
        }
    }

    pub fn staging(&self) -> &StagingStore {
        &self.staging
    }

    /// Run the pipeline for `request`, reading the upload from `body`.
    ///
    /// Returns the updated record with its persisted (unresolved) references.
    #[tracing::instrument(skip(self, body), fields(
        video_id = %request.video_id,
        user_id = %request.user_id,
        kind = %request.kind
    ))]
    pub async fn ingest<R>(&self, request: IngestRequest, body: R) -> Result<Video, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let start = Instant::now();
        let content_type = validate_content_type(request.kind, &request.declared_content_type)?;
        self.ensure_owner(request.video_id, request.user_id).await?;

        let reference = match request.kind {
            MediaKind::Video => {
                self.store_video(body, &content_type, request.size_limit)
                    .await?
            }
            MediaKind::Thumbnail => {
                let data = read_bounded(body, request.size_limit).await?;
                tracing::debug!(size_bytes = data.len(), "Thumbnail read");
                self.thumbnails.store(data, &content_type).await?
            }
        };

        let updated = self
            .videos
            .set_media_reference(request.video_id, request.user_id, request.kind, &reference)
            .await
            .map_err(|e| {
                // The artifact is already stored; log where so it can be reattached.
                tracing::error!(
                    error = %e,
                    reference = %log_reference(&reference),
                    "Media stored but the video record could not be updated"
                );
                AppError::PersistenceFailed(e.to_string())
            })?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            reference = %log_reference(&reference),
            "Upload ingested"
        );

        Ok(updated)
    }

    async fn ensure_owner(&self, video_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let video = self
            .videos
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        if !video.is_owned_by(user_id) {
            return Err(AppError::Forbidden(
                "You are not the owner of this video".to_string(),
            ));
        }
        Ok(())
    }

    async fn store_video<R>(
        &self,
        body: R,
        content_type: &str,
        size_limit: u64,
    ) -> Result<StoredReference, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let staged = self.staging.stage(body, size_limit).await?;
        tracing::debug!(
            path = %staged.path().display(),
            size_bytes = staged.len(),
            "Video staged"
        );

        let probe = self.inspector.probe(staged.path()).await?;
        tracing::debug!(
            aspect_ratio = probe.display_aspect_ratio.as_deref().unwrap_or("-"),
            class = probe.class.as_str(),
            "Video probed"
        );

        let mut normalized = self.normalizer.normalize(staged.path()).await?;
        if let Err(e) = staged.close() {
            tracing::warn!(error = %e, "Failed to remove staged upload");
        }

        let data = normalized.read_all().await?;
        let key = derive_key(probe.class, content_type)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let bucket = self.storage.default_bucket();
        let artifact = self
            .storage
            .put_object(bucket, key.as_str(), data, content_type)
            .await
            .map_err(|e| AppError::processing(PipelineStage::Upload, e))?;

        if let Err(e) = normalized.close() {
            tracing::warn!(error = %e, "Failed to remove normalized file");
        }

        Ok(artifact.reference())
    }
}

/// Inline data URLs are too large for a log line.
fn log_reference(reference: &StoredReference) -> String {
    match reference {
        StoredReference::Inline(data_url) => format!("inline ({} chars)", data_url.len()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;
    use tubely_db::InMemoryVideoRepository;
    use tubely_processing::testing::{FakeInspector, FakeNormalizer};
    use tubely_storage::MemoryStorage;

    struct Harness {
        _dir: TempDir,
        repo: InMemoryVideoRepository,
        storage: Arc<MemoryStorage>,
        inspector: Arc<FakeInspector>,
        normalizer: Arc<FakeNormalizer>,
        service: IngestService,
    }

    impl Harness {
        fn new(inspector: FakeInspector, normalizer: FakeNormalizer) -> Self {
            let dir = TempDir::new().unwrap();
            let repo = InMemoryVideoRepository::new();
            let storage = Arc::new(MemoryStorage::new("tubely"));
            let inspector = Arc::new(inspector);
            let normalizer = Arc::new(normalizer);
            let service = IngestService::new(
                Arc::new(repo.clone()),
                storage.clone(),
                inspector.clone(),
                normalizer.clone(),
                StagingStore::new(Some(dir.path())).unwrap(),
                ThumbnailStore::Inline,
            );
            Self {
                _dir: dir,
                repo,
                storage,
                inspector,
                normalizer,
                service,
            }
        }

        async fn video_owned_by(&self, user_id: Uuid) -> Video {
            let video = Video::new(user_id, "Boots".to_string(), None);
            self.repo.create_video(&video).await.unwrap()
        }

        fn staged_entries(&self) -> usize {
            std::fs::read_dir(self.service.staging().dir()).unwrap().count()
        }
    }

    fn request(user_id: Uuid, video_id: Uuid, kind: MediaKind, ct: &str) -> IngestRequest {
        IngestRequest {
            user_id,
            video_id,
            kind,
            declared_content_type: ct.to_string(),
            size_limit: 1024,
        }
    }

    #[tokio::test]
    async fn test_video_uploads_normalized_bytes_under_classified_key() {
        let h = Harness::new(
            FakeInspector::with_aspect_ratio(Some("16:9")),
            FakeNormalizer::with_marker(b"FAST"),
        );
        let owner = Uuid::new_v4();
        let video = h.video_owned_by(owner).await;

        let updated = h
            .service
            .ingest(
                request(owner, video.id, MediaKind::Video, "video/mp4"),
                &b"moov-at-end"[..],
            )
            .await
            .unwrap();

        let Some(StoredReference::Object { bucket, key }) = updated.video_reference() else {
            panic!("expected object reference");
        };
        assert_eq!(bucket, "tubely");
        assert!(key.starts_with("landscape/"));
        let stored = h.storage.get_object(&bucket, &key).await.unwrap();
        assert_eq!(stored.data.as_ref(), b"FASTmoov-at-end");
        assert_eq!(stored.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(h.staged_entries(), 0);
    }

    #[tokio::test]
    async fn test_probe_failure_skips_upload_and_record() {
        let h = Harness::new(FakeInspector::failing("exit status 1"), FakeNormalizer::new());
        let owner = Uuid::new_v4();
        let video = h.video_owned_by(owner).await;

        let err = h
            .service
            .ingest(
                request(owner, video.id, MediaKind::Video, "video/mp4"),
                &b"data"[..],
            )
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Probe));
        assert_eq!(h.storage.put_count(), 0);
        assert!(h.normalizer.calls().is_empty());
        assert!(h.inspector.calls()[0].existed);
        assert_eq!(h.staged_entries(), 0);
        assert_eq!(h.repo.get_video(video.id).await.unwrap().unwrap(), video);
    }

    #[tokio::test]
    async fn test_normalize_failure_never_uploads_original() {
        let h = Harness::new(
            FakeInspector::with_aspect_ratio(Some("9:16")),
            FakeNormalizer::failing("moov atom not found"),
        );
        let owner = Uuid::new_v4();
        let video = h.video_owned_by(owner).await;

        let err = h
            .service
            .ingest(
                request(owner, video.id, MediaKind::Video, "video/mp4"),
                &b"data"[..],
            )
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Normalize));
        assert_eq!(h.storage.put_count(), 0);
        assert_eq!(h.staged_entries(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_record_untouched() {
        let h = Harness::new(
            FakeInspector::with_aspect_ratio(None),
            FakeNormalizer::new(),
        );
        h.storage.fail_uploads(true);
        let owner = Uuid::new_v4();
        let video = h.video_owned_by(owner).await;

        let err = h
            .service
            .ingest(
                request(owner, video.id, MediaKind::Video, "video/mp4"),
                &b"data"[..],
            )
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Upload));
        assert!(h.repo.get_video(video.id).await.unwrap().unwrap().video_url.is_none());
        assert_eq!(h.staged_entries(), 0);
        assert!(h.normalizer.outputs().iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_oversized_upload_has_no_side_effects() {
        let h = Harness::new(
            FakeInspector::with_aspect_ratio(Some("16:9")),
            FakeNormalizer::new(),
        );
        let owner = Uuid::new_v4();
        let video = h.video_owned_by(owner).await;
        let body = vec![0u8; 1025];

        let err = h
            .service
            .ingest(
                request(owner, video.id, MediaKind::Video, "video/mp4"),
                &body[..],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge { limit: 1024 }));
        assert!(h.inspector.calls().is_empty());
        assert_eq!(h.storage.put_count(), 0);
        assert_eq!(h.staged_entries(), 0);
    }

    #[tokio::test]
    async fn test_ownership_checked_before_reading_body() {
        let h = Harness::new(
            FakeInspector::with_aspect_ratio(Some("16:9")),
            FakeNormalizer::new(),
        );
        let video = h.video_owned_by(Uuid::new_v4()).await;

        let err = h
            .service
            .ingest(
                request(Uuid::new_v4(), video.id, MediaKind::Video, "video/mp4"),
                &b"data"[..],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = h
            .service
            .ingest(
                request(Uuid::new_v4(), Uuid::new_v4(), MediaKind::Video, "video/mp4"),
                &b"data"[..],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(h.inspector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_content_type_checked_per_kind() {
        let h = Harness::new(
            FakeInspector::with_aspect_ratio(Some("16:9")),
            FakeNormalizer::new(),
        );
        let owner = Uuid::new_v4();
        let video = h.video_owned_by(owner).await;

        let err = h
            .service
            .ingest(
                request(owner, video.id, MediaKind::Thumbnail, "video/mp4"),
                &b"data"[..],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType { .. }));

        let err = h
            .service
            .ingest(
                request(owner, video.id, MediaKind::Video, "not a type"),
                &b"data"[..],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_artifact() {
        let h = Harness::new(
            FakeInspector::with_aspect_ratio(Some("16:9")),
            FakeNormalizer::new(),
        );
        let owner = Uuid::new_v4();
        let video = h.video_owned_by(owner).await;
        h.repo.fail_updates(true);

        let err = h
            .service
            .ingest(
                request(owner, video.id, MediaKind::Video, "video/mp4"),
                &b"data"[..],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PersistenceFailed(_)));
        assert_eq!(h.storage.put_count(), 1);
        assert_eq!(h.staged_entries(), 0);
    }

    #[tokio::test]
    async fn test_thumbnail_is_recorded_inline() {
        let h = Harness::new(
            FakeInspector::with_aspect_ratio(None),
            FakeNormalizer::new(),
        );
        let owner = Uuid::new_v4();
        let video = h.video_owned_by(owner).await;

        let updated = h
            .service
            .ingest(
                request(owner, video.id, MediaKind::Thumbnail, "image/png"),
                &b"png-bytes"[..],
            )
            .await
            .unwrap();

        assert!(matches!(
            updated.thumbnail_reference(),
            Some(StoredReference::Inline(_))
        ));
        assert!(h.inspector.calls().is_empty());
        assert_eq!(h.storage.put_count(), 0);
    }

    #[tokio::test]
    async fn test_video_ingest_keeps_thumbnail_set_meanwhile() {
        let h = Harness::new(
            FakeInspector::with_aspect_ratio(Some("16:9")),
            FakeNormalizer::new(),
        );
        let owner = Uuid::new_v4();
        let video_id = h.video_owned_by(owner).await.id;

        let (mut upload, body) = tokio::io::duplex(16);
        let service = h.service.clone();
        let video_ingest = tokio::spawn(async move {
            service
                .ingest(request(owner, video_id, MediaKind::Video, "video/mp4"), body)
                .await
        });

        // Larger than the pipe, so this returns only once staging is consuming.
        upload.write_all(&[7u8; 256]).await.unwrap();

        h.service
            .ingest(
                request(owner, video_id, MediaKind::Thumbnail, "image/png"),
                &b"png-bytes"[..],
            )
            .await
            .unwrap();

        drop(upload);
        let updated = video_ingest.await.unwrap().unwrap();

        assert!(matches!(
            updated.video_reference(),
            Some(StoredReference::Object { .. })
        ));
        assert!(matches!(
            updated.thumbnail_reference(),
            Some(StoredReference::Inline(_))
        ));
        assert_eq!(h.repo.get_video(video_id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_cancelled_ingest_removes_staged_file() {
        let h = Harness::new(
            FakeInspector::with_aspect_ratio(Some("16:9")),
            FakeNormalizer::new(),
        );
        let owner = Uuid::new_v4();
        let video = h.video_owned_by(owner).await;

        let (mut upload, body) = tokio::io::duplex(16);
        let ingest = h
            .service
            .ingest(request(owner, video.id, MediaKind::Video, "video/mp4"), body);

        // The sender stays open, so the ingest can only end by being dropped.
        let (outcome, staged_mid_flight) = tokio::join!(
            tokio::time::timeout(Duration::from_millis(50), ingest),
            async {
                upload.write_all(&[7u8; 256]).await.unwrap();
                h.staged_entries()
            }
        );

        assert!(outcome.is_err(), "ingest finished while its body was still open");
        assert_eq!(staged_mid_flight, 1);
        assert_eq!(h.staged_entries(), 0);
        assert!(h.inspector.calls().is_empty());
        assert_eq!(h.storage.put_count(), 0);
        assert!(h.repo.get_video(video.id).await.unwrap().unwrap().video_url.is_none());
        drop(upload);
    }
}

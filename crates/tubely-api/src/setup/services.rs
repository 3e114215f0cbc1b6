//! Service wiring

use crate::services::{IngestService, ReferenceResolver, ThumbnailStore};
use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{
    FfmpegNormalizer, FfprobeInspector, MediaInspector, MediaNormalizer, StagingStore,
};
use tubely_storage::ObjectStorage;

/// Build the application state around ffprobe and ffmpeg.
pub fn initialize_services(
    config: &Config,
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn ObjectStorage>,
    thumbnails: ThumbnailStore,
) -> Result<Arc<AppState>> {
    let inspector = FfprobeInspector::new(config.ffprobe_path()).context("Invalid FFPROBE_PATH")?;
    let normalizer = FfmpegNormalizer::new(config.ffmpeg_path()).context("Invalid FFMPEG_PATH")?;

    build_state(
        config,
        videos,
        storage,
        Arc::new(inspector),
        Arc::new(normalizer),
        thumbnails,
    )
}

/// Assemble the state from already constructed collaborators.
pub fn build_state(
    config: &Config,
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn ObjectStorage>,
    inspector: Arc<dyn MediaInspector>,
    normalizer: Arc<dyn MediaNormalizer>,
    thumbnails: ThumbnailStore,
) -> Result<Arc<AppState>> {
    let staging =
        StagingStore::new(config.staging_dir()).context("Failed to prepare staging directory")?;
    tracing::info!(staging_dir = %staging.dir().display(), "Staging directory ready");

    let ingest = IngestService::new(
        videos.clone(),
        storage.clone(),
        inspector,
        normalizer,
        staging,
        thumbnails,
    );
    let resolver = ReferenceResolver::new(
        storage.clone(),
        config.video_url_mode(),
        config.cdn_base_url().map(String::from),
        config.signed_url_ttl(),
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        videos,
        storage,
        ingest,
        resolver,
    }))
}

//! Blob store and thumbnail destination setup

use crate::services::ThumbnailStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::{Config, ThumbnailStrategy};
use tubely_storage::{create_storage, LocalAssetStore, ObjectStorage};

pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn ObjectStorage>, ThumbnailStore)> {
    let storage = create_storage(config).context("Failed to initialize blob store")?;
    tracing::info!(
        backend = %storage.backend_type(),
        bucket = storage.default_bucket(),
        url_mode = %config.video_url_mode(),
        "Blob store initialized"
    );

    let thumbnails = setup_thumbnails(config, storage.clone()).await?;
    tracing::info!(strategy = %thumbnails.strategy(), "Thumbnail store initialized");

    Ok((storage, thumbnails))
}

pub async fn setup_thumbnails(
    config: &Config,
    storage: Arc<dyn ObjectStorage>,
) -> Result<ThumbnailStore> {
    Ok(match config.thumbnail_strategy() {
        ThumbnailStrategy::Inline => ThumbnailStore::Inline,
        ThumbnailStrategy::Filesystem => {
            let assets = LocalAssetStore::new(
                config.assets_root(),
                config.assets_base_url().to_string(),
            )
            .await
            .context("Failed to prepare assets directory")?;
            ThumbnailStore::Filesystem(assets)
        }
        ThumbnailStrategy::ObjectStore => ThumbnailStore::ObjectStore(storage),
    })
}

//! Application state shared by every handler.

use crate::services::{IngestService, ReferenceResolver};
use std::sync::Arc;
use tubely_core::models::MediaKind;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_storage::ObjectStorage;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub videos: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub ingest: IngestService,
    pub resolver: ReferenceResolver,
}

impl AppState {
    /// Byte cap for an upload of `kind`.
    pub fn size_limit(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Video => self.config.max_video_size_bytes(),
            MediaKind::Thumbnail => self.config.max_thumbnail_size_bytes(),
        }
    }
}

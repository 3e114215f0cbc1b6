use super::video::VideoRepository;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tubely_core::models::{MediaKind, StoredReference, Video};
use tubely_core::AppError;
use uuid::Uuid;

/// Process-local repository. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryVideoRepository {
    videos: Arc<RwLock<HashMap<Uuid, Video>>>,
    fail_updates: Arc<AtomicBool>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `update_video` and `set_media_reference` calls fail.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    fn poisoned() -> AppError {
        AppError::Internal("video store lock poisoned".to_string())
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create_video(&self, video: &Video) -> Result<Video, AppError> {
        let mut videos = self.videos.write().map_err(|_| Self::poisoned())?;
        if videos.contains_key(&video.id) {
            return Err(AppError::BadRequest(format!(
                "Video {} already exists",
                video.id
            )));
        }
        videos.insert(video.id, video.clone());
        Ok(video.clone())
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let videos = self.videos.read().map_err(|_| Self::poisoned())?;
        Ok(videos.get(&id).cloned())
    }

    async fn update_video(&self, video: &Video) -> Result<Video, AppError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("simulated update failure".to_string()));
        }

        let mut videos = self.videos.write().map_err(|_| Self::poisoned())?;
        match videos.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(video.clone())
            }
            None => Err(AppError::NotFound(format!("Video {} not found", video.id))),
        }
    }

    async fn set_media_reference(
        &self,
        id: Uuid,
        user_id: Uuid,
        kind: MediaKind,
        reference: &StoredReference,
    ) -> Result<Video, AppError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("simulated update failure".to_string()));
        }

        let mut videos = self.videos.write().map_err(|_| Self::poisoned())?;
        match videos.get_mut(&id) {
            Some(existing) if existing.is_owned_by(user_id) => {
                existing.set_reference(kind, reference);
                Ok(existing.clone())
            }
            _ => Err(AppError::NotFound(format!("Video {} not found", id))),
        }
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let videos = self.videos.read().map_err(|_| Self::poisoned())?;
        let mut owned: Vec<Video> = videos
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

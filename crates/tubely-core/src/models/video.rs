use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::media::{MediaKind, StoredReference};

/// A video record as persisted by the metadata store.
///
/// `thumbnail_url` and `video_url` hold stored references (see
/// [`StoredReference`]), not necessarily client-usable URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(user_id: Uuid, title: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            description,
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn thumbnail_reference(&self) -> Option<StoredReference> {
        self.thumbnail_url.as_deref().map(StoredReference::parse)
    }

    pub fn video_reference(&self) -> Option<StoredReference> {
        self.video_url.as_deref().map(StoredReference::parse)
    }

    pub fn set_thumbnail(&mut self, reference: &StoredReference) {
        self.thumbnail_url = Some(reference.to_string());
        self.updated_at = Utc::now();
    }

    pub fn set_video(&mut self, reference: &StoredReference) {
        self.video_url = Some(reference.to_string());
        self.updated_at = Utc::now();
    }

    /// Set whichever reference `kind` targets.
    pub fn set_reference(&mut self, kind: MediaKind, reference: &StoredReference) {
        match kind {
            MediaKind::Thumbnail => self.set_thumbnail(reference),
            MediaKind::Video => self.set_video(reference),
        }
    }
}

/// Video as returned to clients, with references resolved to retrievable URLs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

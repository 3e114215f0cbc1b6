use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Content types accepted for thumbnails.
pub const THUMBNAIL_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Content types accepted for videos.
pub const VIDEO_CONTENT_TYPES: &[&str] = &["video/mp4"];

/// Which reference on a video record an upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Thumbnail,
    Video,
}

impl MediaKind {
    /// Multipart form field carrying the file for this kind.
    pub fn form_field(&self) -> &'static str {
        match self {
            MediaKind::Thumbnail => "thumbnail",
            MediaKind::Video => "video",
        }
    }

    pub fn allowed_content_types(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Thumbnail => THUMBNAIL_CONTENT_TYPES,
            MediaKind::Video => VIDEO_CONTENT_TYPES,
        }
    }

    pub fn allows(&self, content_type: &str) -> bool {
        self.allowed_content_types().contains(&content_type)
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.form_field())
    }
}

/// Orientation bucket derived from a stream's display aspect ratio.
///
/// Used as the first path segment of video storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

impl AspectClass {
    /// Exact `16:9` is landscape, exact `9:16` is portrait, everything else
    /// (including a missing ratio) is other.
    pub fn from_display_aspect_ratio(ratio: Option<&str>) -> Self {
        match ratio {
            Some("16:9") => AspectClass::Landscape,
            Some("9:16") => AspectClass::Portrait,
            _ => AspectClass::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

impl Display for AspectClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// An object that was fully written to a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
}

impl StoredArtifact {
    pub fn reference(&self) -> StoredReference {
        StoredReference::Object {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
        }
    }
}

/// What a record's thumbnail or video field points at, as persisted.
///
/// Object references are stored as `bucket,key` and turned into a
/// client-usable URL only when the record is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredReference {
    /// A `data:` URL embedding the bytes directly.
    Inline(String),
    /// An already client-usable URL (static asset, CDN).
    Url(String),
    /// An object in the blob store.
    Object { bucket: String, key: String },
}

impl StoredReference {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("data:") {
            return StoredReference::Inline(raw.to_string());
        }
        if raw.contains("://") || raw.starts_with('/') {
            return StoredReference::Url(raw.to_string());
        }
        match raw.split_once(',') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                StoredReference::Object {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
            }
            _ => StoredReference::Url(raw.to_string()),
        }
    }
}

impl Display for StoredReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StoredReference::Inline(data_url) => f.write_str(data_url),
            StoredReference::Url(url) => f.write_str(url),
            StoredReference::Object { bucket, key } => write!(f, "{},{}", bucket, key),
        }
    }
}

impl FromStr for StoredReference {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(StoredReference::parse(s))
    }
}

//! Storage key derivation.
//!
//! Video keys are `{aspect_class}/{token}.{ext}`. Tokens come from the thread-local
//! CSPRNG (OS-seeded) and are 16 bytes encoded as URL-safe base64 without padding,
//! so they are always 22 characters from `[A-Za-z0-9_-]`. No existence check is
//! made; collisions are statistically negligible.

use crate::traits::{StorageError, StorageResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use std::fmt::{Display, Formatter, Result as FmtResult};
use tubely_core::models::AspectClass;

const TOKEN_BYTES: usize = 16;

/// Prefix for thumbnails uploaded to the blob store.
pub const THUMBNAIL_PREFIX: &str = "thumbnails";

/// A derived object key, `prefix/token.ext` or `token.ext`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The file name part (`token.ext`).
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// File extension for an accepted content type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "video/mp4" => Some("mp4"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        _ => None,
    }
}

fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn file_name_for(content_type: &str) -> StorageResult<String> {
    let ext = extension_for(content_type).ok_or_else(|| {
        StorageError::InvalidKey(format!("no extension known for {}", content_type))
    })?;
    Ok(format!("{}.{}", random_token(), ext))
}

/// Key for a classified video: `{class}/{token}.{ext}`.
pub fn derive_key(class: AspectClass, content_type: &str) -> StorageResult<StorageKey> {
    Ok(StorageKey(format!(
        "{}/{}",
        class.as_str(),
        file_name_for(content_type)?
    )))
}

/// Unclassified asset name: `{token}.{ext}`, or `{prefix}/{token}.{ext}`.
pub fn derive_asset_name(prefix: Option<&str>, content_type: &str) -> StorageResult<StorageKey> {
    let name = file_name_for(content_type)?;
    Ok(StorageKey(match prefix {
        Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), name),
        None => name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_token(token: &str) {
        assert_eq!(token.len(), 22);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_video_key_shape() {
        let key = derive_key(AspectClass::Landscape, "video/mp4").unwrap();
        let (class, file) = key.as_str().split_once('/').unwrap();
        assert_eq!(class, "landscape");
        let token = file.strip_suffix(".mp4").unwrap();
        assert_token(token);
        assert_eq!(key.file_name(), file);
    }

    #[test]
    fn test_asset_names() {
        let name = derive_asset_name(None, "image/jpeg").unwrap();
        assert!(name.as_str().ends_with(".jpg"));
        assert!(!name.as_str().contains('/'));
        assert_token(name.as_str().trim_end_matches(".jpg"));

        let prefixed = derive_asset_name(Some(THUMBNAIL_PREFIX), "image/png").unwrap();
        assert!(prefixed.as_str().starts_with("thumbnails/"));
        assert!(prefixed.as_str().ends_with(".png"));
    }

    #[test]
    fn test_unknown_content_type_rejected() {
        assert!(derive_key(AspectClass::Other, "video/quicktime").is_err());
        assert_eq!(extension_for("image/gif"), None);
    }

    #[test]
    fn test_tokens_do_not_repeat() {
        let keys: HashSet<String> = (0..1000)
            .map(|_| derive_key(AspectClass::Portrait, "video/mp4").unwrap().into_string())
            .collect();
        assert_eq!(keys.len(), 1000);
    }
}

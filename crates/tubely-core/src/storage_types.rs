use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Blob store backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Where uploaded thumbnails end up and what reference gets persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThumbnailStrategy {
    /// `data:<type>;base64,<bytes>` stored directly on the record.
    Inline,
    /// Written under the assets root and served as a static file.
    Filesystem,
    /// Uploaded to the blob store under `thumbnails/`.
    ObjectStore,
}

impl FromStr for ThumbnailStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inline" => Ok(ThumbnailStrategy::Inline),
            "filesystem" | "fs" => Ok(ThumbnailStrategy::Filesystem),
            "object-store" | "object_store" | "s3" => Ok(ThumbnailStrategy::ObjectStore),
            _ => Err(anyhow::anyhow!("Invalid thumbnail strategy: {}", s)),
        }
    }
}

impl Display for ThumbnailStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ThumbnailStrategy::Inline => write!(f, "inline"),
            ThumbnailStrategy::Filesystem => write!(f, "filesystem"),
            ThumbnailStrategy::ObjectStore => write!(f, "object-store"),
        }
    }
}

/// How `bucket,key` references become client-usable URLs at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoUrlMode {
    /// Time-limited presigned GET URL.
    Signed,
    /// `<CDN_BASE_URL>/<key>`.
    Cdn,
    /// Plain public object URL.
    Direct,
}

impl FromStr for VideoUrlMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "signed" | "presigned" => Ok(VideoUrlMode::Signed),
            "cdn" => Ok(VideoUrlMode::Cdn),
            "direct" | "public" => Ok(VideoUrlMode::Direct),
            _ => Err(anyhow::anyhow!("Invalid video URL mode: {}", s)),
        }
    }
}

impl Display for VideoUrlMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            VideoUrlMode::Signed => write!(f, "signed"),
            VideoUrlMode::Cdn => write!(f, "cdn"),
            VideoUrlMode::Direct => write!(f, "direct"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "Object-Store".parse::<ThumbnailStrategy>().unwrap(),
            ThumbnailStrategy::ObjectStore
        );
        assert_eq!("CDN".parse::<VideoUrlMode>().unwrap(), VideoUrlMode::Cdn);
        assert!("nfs".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for strategy in [
            ThumbnailStrategy::Inline,
            ThumbnailStrategy::Filesystem,
            ThumbnailStrategy::ObjectStore,
        ] {
            assert_eq!(strategy.to_string().parse::<ThumbnailStrategy>().unwrap(), strategy);
        }
    }
}

//! Configuration module
//!
//! One immutable [`Config`] is built at startup from the environment and handed
//! to every component constructor.

use std::env;
use std::path::PathBuf;

use crate::storage_types::{StorageBackend, ThumbnailStrategy, VideoUrlMode};

const DEFAULT_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SIGNED_URL_TTL_SECS: u64 = 600;
const MAX_VIDEO_SIZE_MB: u64 = 1024;
const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
const BYTES_PER_MB: u64 = 1024 * 1024;
const HTTP_CONCURRENCY_LIMIT: usize = 1_000;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
    pub jwt_secret: String,
    // Metadata store
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Blob store
    pub storage_backend: StorageBackend,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>, // MinIO, LocalStack, ...
    pub video_url_mode: VideoUrlMode,
    pub cdn_base_url: Option<String>,
    pub signed_url_ttl_secs: u64,
    // Thumbnails
    pub thumbnail_strategy: ThumbnailStrategy,
    pub assets_root: PathBuf,
    pub assets_base_url: String,
    // Pipeline
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub staging_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    /// Development defaults: in-memory stores, signed URLs, inline thumbnails.
    /// `jwt_secret` is left empty and must be filled in before `validate()`.
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            jwt_secret: String::new(),
            database_url: None,
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            storage_backend: StorageBackend::Memory,
            s3_bucket: "tubely".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            video_url_mode: VideoUrlMode::Signed,
            cdn_base_url: None,
            signed_url_ttl_secs: SIGNED_URL_TTL_SECS,
            thumbnail_strategy: ThumbnailStrategy::Inline,
            assets_root: PathBuf::from("./assets"),
            assets_base_url: format!("http://localhost:{}/assets", DEFAULT_PORT),
            max_video_size_bytes: MAX_VIDEO_SIZE_MB * BYTES_PER_MB,
            max_thumbnail_size_bytes: MAX_THUMBNAIL_SIZE_MB * BYTES_PER_MB,
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            staging_dir: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) if env::var("S3_BUCKET").is_ok() => StorageBackend::S3,
            Err(_) => StorageBackend::Memory,
        };

        let video_url_mode = env::var("VIDEO_URL_MODE")
            .map(|v| v.parse::<VideoUrlMode>())
            .unwrap_or(Ok(VideoUrlMode::Signed))?;

        let thumbnail_strategy = env::var("THUMBNAIL_STRATEGY")
            .map(|v| v.parse::<ThumbnailStrategy>())
            .unwrap_or(Ok(ThumbnailStrategy::Inline))?;

        let max_video_size_mb = env::var("MAX_VIDEO_SIZE_MB")
            .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be a valid number"))?;

        let max_thumbnail_size_mb = env::var("MAX_THUMBNAIL_SIZE_MB")
            .unwrap_or_else(|_| MAX_THUMBNAIL_SIZE_MB.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("MAX_THUMBNAIL_SIZE_MB must be a valid number"))?;

        let http_concurrency_limit = env::var("HTTP_CONCURRENCY_LIMIT")
            .unwrap_or_else(|_| HTTP_CONCURRENCY_LIMIT.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be a valid number"))?;

        Ok(Self {
            server_port,
            environment,
            cors_origins,
            http_concurrency_limit,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            database_url: non_empty_var("DATABASE_URL"),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").unwrap_or_else(|_| "tubely".to_string()),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| "us-east-1".to_string()),
            s3_endpoint: non_empty_var("S3_ENDPOINT"),
            video_url_mode,
            cdn_base_url: non_empty_var("CDN_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            signed_url_ttl_secs: env::var("SIGNED_URL_TTL_SECS")
                .unwrap_or_else(|_| SIGNED_URL_TTL_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SIGNED_URL_TTL_SECS must be a valid number"))?,
            thumbnail_strategy,
            assets_root: env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./assets")),
            assets_base_url: env::var("ASSETS_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}/assets", server_port)),
            max_video_size_bytes: megabytes("MAX_VIDEO_SIZE_MB", max_video_size_mb)?,
            max_thumbnail_size_bytes: megabytes("MAX_THUMBNAIL_SIZE_MB", max_thumbnail_size_mb)?,
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            staging_dir: non_empty_var("STAGING_DIR").map(PathBuf::from),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow::anyhow!("JWT_SECRET must not be empty"));
        }
        if self.is_production() && self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters in production"
            ));
        }
        if self.is_production() && self.database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be set in production; the in-memory metadata store is for development only"
            ));
        }
        if self.is_production() && self.storage_backend == StorageBackend::Memory {
            return Err(anyhow::anyhow!(
                "STORAGE_BACKEND=memory is not allowed in production"
            ));
        }
        if self.storage_backend == StorageBackend::S3 && self.s3_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("S3_BUCKET must be set when STORAGE_BACKEND=s3"));
        }
        if self.video_url_mode == VideoUrlMode::Cdn && self.cdn_base_url.is_none() {
            return Err(anyhow::anyhow!(
                "CDN_BASE_URL must be set when VIDEO_URL_MODE=cdn"
            ));
        }
        if self.video_url_mode == VideoUrlMode::Signed && self.signed_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than 0"));
        }
        if self.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be greater than 0"));
        }
        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be greater than 0"));
        }
        if self.max_thumbnail_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_THUMBNAIL_SIZE_MB must be greater than 0"));
        }
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        Ok(())
    }
}

fn megabytes(name: &str, mb: u64) -> Result<u64, anyhow::Error> {
    mb.checked_mul(BYTES_PER_MB)
        .ok_or_else(|| anyhow::anyhow!("{} is too large: {} MB", name, mb))
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Immutable service configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    pub fn new(inner: ServiceConfig) -> Self {
        Config(Box::new(inner))
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.0.validate()
    }

    pub fn is_production(&self) -> bool {
        self.0.is_production()
    }

    pub fn server_port(&self) -> u16 {
        self.0.server_port
    }

    pub fn environment(&self) -> &str {
        &self.0.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.0.cors_origins
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.0.http_concurrency_limit
    }

    pub fn jwt_secret(&self) -> &str {
        &self.0.jwt_secret
    }

    pub fn database_url(&self) -> Option<&str> {
        self.0.database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.0.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.0.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.0.storage_backend
    }

    pub fn s3_bucket(&self) -> &str {
        &self.0.s3_bucket
    }

    pub fn s3_region(&self) -> &str {
        &self.0.s3_region
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.0.s3_endpoint.as_deref()
    }

    pub fn video_url_mode(&self) -> VideoUrlMode {
        self.0.video_url_mode
    }

    pub fn cdn_base_url(&self) -> Option<&str> {
        self.0.cdn_base_url.as_deref()
    }

    pub fn signed_url_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.0.signed_url_ttl_secs)
    }

    pub fn thumbnail_strategy(&self) -> ThumbnailStrategy {
        self.0.thumbnail_strategy
    }

    pub fn assets_root(&self) -> &std::path::Path {
        &self.0.assets_root
    }

    pub fn assets_base_url(&self) -> &str {
        &self.0.assets_base_url
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.0.max_video_size_bytes
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.0.max_thumbnail_size_bytes
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.0.ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.0.ffmpeg_path
    }

    pub fn staging_dir(&self) -> Option<&std::path::Path> {
        self.0.staging_dir.as_deref()
    }
}

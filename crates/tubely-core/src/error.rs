//! Error types module
//!
//! This module provides the core error types used throughout Tubely.
//! All errors are unified under the `AppError` enum which can represent request,
//! ownership, pipeline and persistence failures.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like resource limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "PROBE_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Step of the ingestion pipeline an external failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Staging,
    Probe,
    Normalize,
    Read,
    Upload,
    AssetWrite,
    Sign,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Staging => "staging",
            PipelineStage::Probe => "probe",
            PipelineStage::Normalize => "normalize",
            PipelineStage::Read => "read",
            PipelineStage::Upload => "upload",
            PipelineStage::AssetWrite => "asset-write",
            PipelineStage::Sign => "sign",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unsupported media type '{content_type}' (allowed: {})", .allowed.join(", "))]
    UnsupportedMediaType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Payload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Processing failed at {stage} stage: {message}")]
    ProcessingFailed {
        stage: PipelineStage,
        message: String,
    },

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Wrap an external step failure with the stage it came from.
    pub fn processing(stage: PipelineStage, err: impl Display) -> Self {
        AppError::ProcessingFailed {
            stage,
            message: err.to_string(),
        }
    }

    /// The pipeline stage for `ProcessingFailed`, `None` for every other variant.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            AppError::ProcessingFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::BadRequest(format!("Invalid ID: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, true, LogLevel::Error),
        AppError::BadRequest(_) => (400, "BAD_REQUEST", false, false, LogLevel::Debug),
        AppError::Unauthorized(_) => (401, "UNAUTHORIZED", false, false, LogLevel::Debug),
        AppError::Forbidden(_) => (403, "FORBIDDEN", false, false, LogLevel::Warn),
        AppError::UnsupportedMediaType { .. } => (
            415,
            "UNSUPPORTED_MEDIA_TYPE",
            false,
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge { .. } => {
            (413, "PAYLOAD_TOO_LARGE", false, false, LogLevel::Debug)
        }
        AppError::NotFound(_) => (404, "NOT_FOUND", false, false, LogLevel::Debug),
        AppError::ProcessingFailed { stage, .. } => match stage {
            PipelineStage::Staging => (500, "STAGING_FAILED", true, true, LogLevel::Error),
            PipelineStage::Probe => (500, "PROBE_FAILED", false, true, LogLevel::Error),
            PipelineStage::Normalize => (500, "NORMALIZE_FAILED", false, true, LogLevel::Error),
            PipelineStage::Read => (500, "READ_FAILED", true, true, LogLevel::Error),
            PipelineStage::Upload => (502, "UPLOAD_FAILED", true, true, LogLevel::Error),
            PipelineStage::AssetWrite => {
                (500, "ASSET_WRITE_FAILED", true, true, LogLevel::Error)
            }
            PipelineStage::Sign => (502, "SIGNING_FAILED", true, true, LogLevel::Error),
        },
        AppError::PersistenceFailed(_) => {
            (500, "PERSISTENCE_FAILED", true, true, LogLevel::Error)
        }
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, true, LogLevel::Error),
        AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, true, LogLevel::Error)
        }
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::UnsupportedMediaType { .. } => "UnsupportedMediaType",
            AppError::PayloadTooLarge { .. } => "PayloadTooLarge",
            AppError::NotFound(_) => "NotFound",
            AppError::ProcessingFailed { .. } => "ProcessingFailed",
            AppError::PersistenceFailed(_) => "PersistenceFailed",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(&format!(": {}", err));
            source = err.source();
        }
        message
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::UnsupportedMediaType {
                content_type,
                allowed,
            } => format!(
                "Content type '{}' is not supported here; allowed: {}",
                content_type,
                allowed.join(", ")
            ),
            AppError::PayloadTooLarge { limit } => format!(
                "File exceeds the maximum allowed size of {}",
                display_size(*limit)
            ),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::ProcessingFailed { stage, .. } => match stage {
                PipelineStage::Probe => "Couldn't inspect the uploaded media".to_string(),
                PipelineStage::Normalize => "Couldn't process the uploaded video".to_string(),
                PipelineStage::Upload => "Couldn't store the uploaded media".to_string(),
                PipelineStage::Sign => "Couldn't generate a media URL".to_string(),
                _ => "Couldn't handle the uploaded media".to_string(),
            },
            AppError::PersistenceFailed(_) => "Couldn't update the video record".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Something went wrong".to_string()
            }
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }
}

/// Whole MB or KB when the limit is a multiple of one, bytes otherwise.
fn display_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{} KB", bytes / KB)
    } else {
        format!("{} bytes", bytes)
    }
}

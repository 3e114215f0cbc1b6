use std::io;
use tubely_core::{AppError, PipelineStage};

/// Failures of the local pipeline steps.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Failed to stage upload: {0}")]
    Staging(#[source] io::Error),

    #[error("ffprobe failed: {0}")]
    ProbeFailed(String),

    #[error("ffmpeg failed: {0}")]
    NormalizeFailed(String),

    #[error("Failed to read staged file: {0}")]
    Read(#[source] io::Error),

    #[error("Invalid tool path: {0}")]
    InvalidToolPath(String),
}

impl ProcessingError {
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            ProcessingError::TooLarge { .. } | ProcessingError::InvalidToolPath(_) => None,
            ProcessingError::Staging(_) => Some(PipelineStage::Staging),
            ProcessingError::ProbeFailed(_) => Some(PipelineStage::Probe),
            ProcessingError::NormalizeFailed(_) => Some(PipelineStage::Normalize),
            ProcessingError::Read(_) => Some(PipelineStage::Read),
        }
    }
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::TooLarge { limit } => AppError::PayloadTooLarge { limit },
            ProcessingError::InvalidToolPath(msg) => AppError::Internal(msg),
            other => match other.stage() {
                Some(stage) => AppError::processing(stage, &other),
                None => AppError::Internal(other.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubely_core::ErrorMetadata;

    #[test]
    fn test_maps_to_app_error_by_stage() {
        let probe: AppError = ProcessingError::ProbeFailed("exit status 1".into()).into();
        assert_eq!(probe.stage(), Some(PipelineStage::Probe));
        assert_eq!(probe.error_code(), "PROBE_FAILED");

        let normalize: AppError = ProcessingError::NormalizeFailed("bad".into()).into();
        assert_eq!(normalize.error_code(), "NORMALIZE_FAILED");

        let too_large: AppError = ProcessingError::TooLarge { limit: 10 }.into();
        assert_eq!(too_large.http_status_code(), 413);

        let staging: AppError = ProcessingError::Staging(io::Error::other("disk full")).into();
        assert_eq!(staging.error_code(), "STAGING_FAILED");
    }
}

//! Container rewrite with ffmpeg so playback can start before the download ends.

use crate::error::ProcessingError;
use crate::staging::StagedFile;
use crate::tool;
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

const OUTPUT_SUFFIX: &str = ".processing";

#[async_trait]
pub trait MediaNormalizer: Send + Sync {
    /// Produce a faststart copy of `input` as a new staged file.
    async fn normalize(&self, input: &Path) -> Result<StagedFile, ProcessingError>;
}

/// `<input>.processing`, next to the input.
pub fn output_path_for(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

pub struct FfmpegNormalizer {
    ffmpeg_path: String,
}

impl FfmpegNormalizer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Result<Self, ProcessingError> {
        let ffmpeg_path = ffmpeg_path.into();
        tool::validate_tool_path(&ffmpeg_path)?;
        Ok(Self { ffmpeg_path })
    }
}

#[async_trait]
impl MediaNormalizer for FfmpegNormalizer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn normalize(&self, input: &Path) -> Result<StagedFile, ProcessingError> {
        let start = std::time::Instant::now();
        let output_path = output_path_for(input);
        // Owned before ffmpeg starts: a partial output is removed on any exit.
        let guard = TempPath::try_from_path(&output_path)
            .map_err(|e| ProcessingError::NormalizeFailed(format!("Invalid output path: {}", e)))?;

        let output = tool::run(
            &self.ffmpeg_path,
            [
                OsStr::new("-y"),
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-c"),
                OsStr::new("copy"),
                OsStr::new("-movflags"),
                OsStr::new("faststart"),
                OsStr::new("-f"),
                OsStr::new("mp4"),
                output_path.as_os_str(),
            ],
        )
        .await
        .map_err(|e| ProcessingError::NormalizeFailed(format!("Failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = tool::stderr_tail(&output.stderr);
            tracing::warn!(
                status = %output.status,
                stderr = %stderr,
                "ffmpeg exited with failure"
            );
            return Err(ProcessingError::NormalizeFailed(format!(
                "{}: {}",
                output.status, stderr
            )));
        }

        let staged = StagedFile::adopt(guard)
            .await
            .map_err(|e| ProcessingError::NormalizeFailed(format!("Output unreadable: {}", e)))?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            size_bytes = staged.len(),
            "Faststart rewrite completed"
        );

        Ok(staged)
    }
}

//! Stream inspection with ffprobe.

use crate::error::ProcessingError;
use crate::tool;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use tubely_core::models::AspectClass;

/// Geometry of the first stream of a media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaProbe {
    pub display_aspect_ratio: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec: Option<String>,
    pub class: AspectClass,
}

impl MediaProbe {
    pub fn from_aspect_ratio(ratio: Option<&str>) -> Self {
        Self {
            display_aspect_ratio: ratio.map(str::to_string),
            width: None,
            height: None,
            codec: None,
            class: AspectClass::from_display_aspect_ratio(ratio),
        }
    }
}

#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<MediaProbe, ProcessingError>;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    display_aspect_ratio: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    codec_name: Option<String>,
}

/// Parse `ffprobe -print_format json -show_streams` output.
pub fn parse_probe_output(stdout: &[u8]) -> Result<MediaProbe, ProcessingError> {
    let output: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ProcessingError::ProbeFailed(format!("Failed to parse ffprobe output: {}", e)))?;

    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| ProcessingError::ProbeFailed("No streams found".to_string()))?;

    let class = AspectClass::from_display_aspect_ratio(stream.display_aspect_ratio.as_deref());

    Ok(MediaProbe {
        display_aspect_ratio: stream.display_aspect_ratio,
        width: stream.width,
        height: stream.height,
        codec: stream.codec_name,
        class,
    })
}

pub struct FfprobeInspector {
    ffprobe_path: String,
}

impl FfprobeInspector {
    pub fn new(ffprobe_path: impl Into<String>) -> Result<Self, ProcessingError> {
        let ffprobe_path = ffprobe_path.into();
        tool::validate_tool_path(&ffprobe_path)?;
        Ok(Self { ffprobe_path })
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<MediaProbe, ProcessingError> {
        let start = std::time::Instant::now();

        let output = tool::run(
            &self.ffprobe_path,
            [
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-print_format"),
                OsStr::new("json"),
                OsStr::new("-show_streams"),
                path.as_os_str(),
            ],
        )
        .await
        .map_err(|e| ProcessingError::ProbeFailed(format!("Failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = tool::stderr_tail(&output.stderr);
            tracing::warn!(
                status = %output.status,
                stderr = %stderr,
                "ffprobe exited with failure"
            );
            return Err(ProcessingError::ProbeFailed(format!(
                "{}: {}",
                output.status, stderr
            )));
        }

        let probe = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            display_aspect_ratio = probe.display_aspect_ratio.as_deref().unwrap_or("none"),
            width = probe.width,
            height = probe.height,
            class = %probe.class,
            "Media probe completed"
        );

        Ok(probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_stream() {
        let json = br#"{
            "streams": [
                {"index": 0, "codec_name": "h264", "width": 1920, "height": 1080,
                 "display_aspect_ratio": "16:9"},
                {"index": 1, "codec_name": "aac"}
            ]
        }"#;
        let probe = parse_probe_output(json).unwrap();
        assert_eq!(probe.class, AspectClass::Landscape);
        assert_eq!(probe.width, Some(1920));
        assert_eq!(probe.codec.as_deref(), Some("h264"));
    }

    #[test]
    fn test_missing_ratio_is_other() {
        let probe = parse_probe_output(br#"{"streams":[{"codec_name":"aac"}]}"#).unwrap();
        assert_eq!(probe.display_aspect_ratio, None);
        assert_eq!(probe.class, AspectClass::Other);
    }

    #[test]
    fn test_zero_streams_fails() {
        assert!(matches!(
            parse_probe_output(br#"{"streams":[]}"#),
            Err(ProcessingError::ProbeFailed(_))
        ));
        assert!(matches!(
            parse_probe_output(br#"{}"#),
            Err(ProcessingError::ProbeFailed(_))
        ));
    }

    #[test]
    fn test_garbage_fails() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(ProcessingError::ProbeFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_probe_failure() {
        let inspector = FfprobeInspector::new("/nonexistent/ffprobe-tubely").unwrap();
        let err = inspector.probe(Path::new("/tmp/none.mp4")).await.unwrap_err();
        assert!(matches!(err, ProcessingError::ProbeFailed(_)));
    }

    #[test]
    fn test_rejects_unsafe_tool_path() {
        assert!(FfprobeInspector::new("ffprobe && curl evil").is_err());
    }
}

//! Fake tools for tests that must not depend on ffmpeg being installed.

use crate::error::ProcessingError;
use crate::normalize::{output_path_for, MediaNormalizer};
use crate::probe::{MediaInspector, MediaProbe};
use crate::staging::StagedFile;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempPath;

/// A call observed by a fake tool.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub path: PathBuf,
    /// Whether the input file existed when the tool was invoked.
    pub existed: bool,
    pub bytes: Vec<u8>,
}

fn observe(path: &Path) -> ToolCall {
    ToolCall {
        path: path.to_path_buf(),
        existed: path.exists(),
        bytes: std::fs::read(path).unwrap_or_default(),
    }
}

/// Returns a fixed probe result, or fails every call.
pub struct FakeInspector {
    result: Result<MediaProbe, String>,
    calls: Mutex<Vec<ToolCall>>,
}

impl FakeInspector {
    pub fn with_aspect_ratio(ratio: Option<&str>) -> Self {
        Self {
            result: Ok(MediaProbe::from_aspect_ratio(ratio)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn probe(&self, path: &Path) -> Result<MediaProbe, ProcessingError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(observe(path));
        }
        self.result
            .clone()
            .map_err(ProcessingError::ProbeFailed)
    }
}

/// Copies the input to `<input>.processing`, optionally prefixing marker bytes
/// so tests can tell the normalized artifact from the original.
pub struct FakeNormalizer {
    marker: Vec<u8>,
    fail: Option<String>,
    calls: Mutex<Vec<ToolCall>>,
    outputs: Mutex<Vec<PathBuf>>,
}

impl FakeNormalizer {
    pub fn new() -> Self {
        Self::with_marker(b"")
    }

    pub fn with_marker(marker: &[u8]) -> Self {
        Self {
            marker: marker.to_vec(),
            fail: None,
            calls: Mutex::new(Vec::new()),
            outputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail: Some(message.into()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Every output path this fake produced.
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.outputs.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

impl Default for FakeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaNormalizer for FakeNormalizer {
    async fn normalize(&self, input: &Path) -> Result<StagedFile, ProcessingError> {
        let call = observe(input);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }
        if let Some(ref message) = self.fail {
            return Err(ProcessingError::NormalizeFailed(message.clone()));
        }

        let output_path = output_path_for(input);
        let guard = TempPath::try_from_path(&output_path)
            .map_err(|e| ProcessingError::NormalizeFailed(e.to_string()))?;
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.push(output_path.clone());
        }

        let mut contents = self.marker.clone();
        contents.extend_from_slice(&call.bytes);
        tokio::fs::write(&output_path, contents)
            .await
            .map_err(|e| ProcessingError::NormalizeFailed(e.to_string()))?;

        StagedFile::adopt(guard).await
    }
}

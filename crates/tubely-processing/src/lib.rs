//! Tubely Processing Library
//!
//! The local half of the ingestion pipeline: staging uploads on disk, probing
//! them with ffprobe, rewriting them with ffmpeg, and validating declared
//! content types.

pub mod error;
pub mod normalize;
pub mod probe;
pub mod staging;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
mod tool;
pub mod validator;

pub use error::ProcessingError;
pub use normalize::{FfmpegNormalizer, MediaNormalizer};
pub use probe::{parse_probe_output, FfprobeInspector, MediaInspector, MediaProbe};
pub use staging::{read_bounded, StagedFile, StagingStore};
pub use validator::{parse_media_type, validate_content_type, ValidationError};

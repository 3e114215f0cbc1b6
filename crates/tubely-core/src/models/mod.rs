//! Data models shared by the pipeline, the metadata store and the API.

mod media;
mod video;

pub use media::*;
pub use video::*;

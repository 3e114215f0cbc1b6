//! Repositories for video records
//!
//! `VideoRepository` is the seam the API depends on. `PgVideoRepository` is the
//! Postgres implementation; `InMemoryVideoRepository` backs local development
//! without a database and the HTTP tests.

pub mod memory;
pub mod video;

pub use memory::InMemoryVideoRepository;
pub use video::{PgVideoRepository, VideoRepository};

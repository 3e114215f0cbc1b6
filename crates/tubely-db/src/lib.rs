//! Tubely metadata store.

pub mod db;

pub use db::{InMemoryVideoRepository, PgVideoRepository, VideoRepository};

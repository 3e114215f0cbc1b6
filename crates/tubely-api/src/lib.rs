//! Tubely API Library
//!
//! HTTP surface of the ingestion service: handlers, authentication, the
//! ingest orchestrator and application setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod services;
pub mod setup;
pub mod telemetry;
mod utils;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use api_doc::get_openapi_spec;
pub use error::{ErrorResponse, HttpAppError};
pub use services::{IngestRequest, IngestService, ReferenceResolver, ThumbnailStore};
pub use state::AppState;

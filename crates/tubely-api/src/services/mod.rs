pub mod ingest;
pub mod resolver;
pub mod thumbnail;

pub use ingest::{IngestRequest, IngestService};
pub use resolver::ReferenceResolver;
pub use thumbnail::ThumbnailStore;

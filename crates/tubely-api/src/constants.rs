//! API constants

/// API base path prefix
pub const API_BASE: &str = "/api";

/// Path static thumbnail assets are served under.
pub const ASSETS_PATH: &str = "/assets";

/// Room for multipart boundaries and headers on top of the file size cap.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

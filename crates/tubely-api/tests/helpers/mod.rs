//! Test helpers: build AppState and router for integration tests.
//!
//! The router is the production one; only the collaborators differ. Records
//! live in an in-memory repository, objects in an in-memory blob store, and
//! ffprobe/ffmpeg are replaced by fakes so no tools need to be installed.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::setup::{routes, services, storage};
use tubely_api::state::AppState;
use tubely_core::{Config, ServiceConfig, ThumbnailStrategy, VideoUrlMode};
use tubely_db::InMemoryVideoRepository;
use tubely_processing::testing::{FakeInspector, FakeNormalizer};
use tubely_storage::MemoryStorage;

pub const TEST_BUCKET: &str = "tubely-test";
pub const TEST_ASSETS_BASE_URL: &str = "http://localhost:8091/assets";
pub const TEST_CDN_BASE_URL: &str = "https://cdn.example.com";

/// Knobs for one test application.
pub struct TestOptions {
    pub inspector: FakeInspector,
    pub normalizer: FakeNormalizer,
    pub thumbnail_strategy: ThumbnailStrategy,
    pub video_url_mode: VideoUrlMode,
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            inspector: FakeInspector::with_aspect_ratio(Some("16:9")),
            normalizer: FakeNormalizer::with_marker(fixtures::FASTSTART_MARKER),
            thumbnail_strategy: ThumbnailStrategy::Inline,
            video_url_mode: VideoUrlMode::Signed,
            max_video_size_bytes: 5 * 1024 * 1024,
            max_thumbnail_size_bytes: 256 * 1024,
        }
    }
}

/// Test application: server plus handles on every fake collaborator.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub repo: InMemoryVideoRepository,
    pub storage: Arc<MemoryStorage>,
    pub inspector: Arc<FakeInspector>,
    pub normalizer: Arc<FakeNormalizer>,
    pub staging_dir: TempDir,
    pub assets_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Files currently left in the staging directory.
    pub fn staged_files(&self) -> usize {
        count_entries(self.staging_dir.path())
    }
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let staging_dir = TempDir::new().expect("Failed to create staging dir");
    let assets_dir = TempDir::new().expect("Failed to create assets dir");

    let config = Config::new(ServiceConfig {
        jwt_secret: auth::TEST_JWT_SECRET.to_string(),
        s3_bucket: TEST_BUCKET.to_string(),
        video_url_mode: options.video_url_mode,
        cdn_base_url: Some(TEST_CDN_BASE_URL.to_string()),
        thumbnail_strategy: options.thumbnail_strategy,
        assets_root: assets_dir.path().to_path_buf(),
        assets_base_url: TEST_ASSETS_BASE_URL.to_string(),
        max_video_size_bytes: options.max_video_size_bytes,
        max_thumbnail_size_bytes: options.max_thumbnail_size_bytes,
        staging_dir: Some(staging_dir.path().to_path_buf()),
        ..Default::default()
    });
    config.validate().expect("Test config must be valid");

    let repo = InMemoryVideoRepository::new();
    let storage = Arc::new(MemoryStorage::new(TEST_BUCKET));
    let inspector = Arc::new(options.inspector);
    let normalizer = Arc::new(options.normalizer);

    let thumbnails = storage::setup_thumbnails(&config, storage.clone())
        .await
        .expect("Failed to set up thumbnail store");
    let state = services::build_state(
        &config,
        Arc::new(repo.clone()),
        storage.clone(),
        inspector.clone(),
        normalizer.clone(),
        thumbnails,
    )
    .expect("Failed to build state");

    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        repo,
        storage,
        inspector,
        normalizer,
        staging_dir,
        assets_dir,
    }
}

//! Route configuration and setup.

mod health;

use crate::auth::{auth_middleware, AuthState};
use crate::constants::{ASSETS_PATH, MULTIPART_OVERHEAD_BYTES};
use crate::error::configure_error_details;
use crate::handlers::{thumbnail_upload, video_upload, videos};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tubely_core::models::MediaKind;
use tubely_core::{Config, ThumbnailStrategy};

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    configure_error_details(config);
    let cors = setup_cors(config)?;
    let auth_state = AuthState::new(config.jwt_secret());

    let protected = protected_routes(&state).layer(axum::middleware::from_fn_with_state(
        Arc::new(auth_state),
        auth_middleware,
    ));

    let mut app = public_routes().merge(protected);

    if config.thumbnail_strategy() == ThumbnailStrategy::Filesystem {
        tracing::info!(
            path = ASSETS_PATH,
            root = %config.assets_root().display(),
            "Serving thumbnail assets"
        );
        app = app.nest_service(ASSETS_PATH, ServeDir::new(config.assets_root()));
    }

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    tracing::info!(http_concurrency_limit, "HTTP concurrency limit configured");

    let app = app
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn upload_body_limit(state: &AppState, kind: MediaKind) -> RequestBodyLimitLayer {
    let limit = state.size_limit(kind).saturating_add(MULTIPART_OVERHEAD_BYTES);
    RequestBodyLimitLayer::new(usize::try_from(limit).unwrap_or(usize::MAX))
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/healthz", get(health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

fn protected_routes(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/videos",
            post(videos::create_video).get(videos::list_videos),
        )
        .route("/api/videos/{video_id}", get(videos::get_video))
        .route(
            "/api/video_upload/{video_id}",
            post(video_upload::upload_video).layer(upload_body_limit(state, MediaKind::Video)),
        )
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(thumbnail_upload::upload_thumbnail)
                .layer(upload_body_limit(state, MediaKind::Thumbnail)),
        )
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

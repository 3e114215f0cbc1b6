//! Health check handler.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(super) struct HealthResponse {
    pub status: &'static str,
    pub storage: String,
    pub video_url_mode: String,
    pub thumbnail_strategy: String,
    pub staging: &'static str,
}

/// Liveness plus a cheap check that the staging directory is still there.
pub(super) async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let staging_ok = tokio::fs::try_exists(state.ingest.staging().dir())
        .await
        .unwrap_or(false);

    let response = HealthResponse {
        status: if staging_ok { "healthy" } else { "degraded" },
        storage: state.storage.backend_type().to_string(),
        video_url_mode: state.config.video_url_mode().to_string(),
        thumbnail_strategy: state.config.thumbnail_strategy().to_string(),
        staging: if staging_ok { "ok" } else { "missing" },
    };

    let status = if staging_ok {
        StatusCode::OK
    } else {
        tracing::error!(
            staging_dir = %state.ingest.staging().dir().display(),
            "Staging directory missing"
        );
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

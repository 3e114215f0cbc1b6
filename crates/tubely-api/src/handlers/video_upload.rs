use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{ingest_multipart, parse_video_id};
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use tubely_core::models::{MediaKind, VideoResponse};

/// Upload the video file for a record.
///
/// The file is staged, probed, rewritten for faststart playback and uploaded
/// under a key prefixed with its orientation.
#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "uploads",
    params(
        ("video_id" = String, Path, description = "Video record ID")
    ),
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "Form with a `video` file field (video/mp4)"
    ),
    responses(
        (status = 200, description = "Video stored and record updated", body = VideoResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not the owner of this video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Content type not allowed", body = ErrorResponse),
        (status = 500, description = "Processing failed", body = ErrorResponse),
        (status = 502, description = "Blob store unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;
    ingest_multipart(&state, user, video_id, MediaKind::Video, multipart).await
}

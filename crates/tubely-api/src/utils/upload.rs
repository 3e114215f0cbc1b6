//! Common utilities for file upload handlers

use crate::error::HttpAppError;
use crate::services::IngestRequest;
use crate::state::AppState;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::Json;
use futures::TryStreamExt;
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tubely_core::models::{MediaKind, VideoResponse};
use tubely_core::AppError;
use uuid::Uuid;

use crate::auth::AuthUser;

/// Parse the `{video_id}` path segment.
pub fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid ID".to_string()))
}

fn multipart_error(err: MultipartError, limit: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge { limit };
    }
    AppError::BadRequest(format!("Couldn't parse form: {}", err.body_text()))
}

/// The field body as a byte reader. Nothing is buffered beyond what the
/// consumer pulls.
pub fn field_reader<'a>(field: Field<'a>) -> impl AsyncRead + Unpin + Send + 'a {
    StreamReader::new(Box::pin(field.map_err(io::Error::other)))
}

/// Pull the file field for `kind` out of `multipart` and run it through the
/// ingest pipeline, returning the record with resolved URLs.
pub async fn ingest_multipart(
    state: &AppState,
    user: AuthUser,
    video_id: Uuid,
    kind: MediaKind,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let size_limit = state.size_limit(kind);
    let field_name = kind.form_field();

    // Other fields are skipped; multer discards their bodies.
    let field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, size_limit))?
        {
            Some(field) if field.name() == Some(field_name) => break field,
            Some(_) => continue,
            None => {
                return Err(AppError::BadRequest(format!(
                    "Missing form field '{}'",
                    field_name
                ))
                .into())
            }
        }
    };

    let declared_content_type = field
        .content_type()
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("No Content-Type specified".to_string()))?;

    tracing::debug!(
        video_id = %video_id,
        file_name = field.file_name().unwrap_or("-"),
        content_type = %declared_content_type,
        "Receiving upload"
    );

    let request = IngestRequest {
        user_id: user.user_id,
        video_id,
        kind,
        declared_content_type,
        size_limit,
    };
    let video = state.ingest.ingest(request, field_reader(field)).await?;
    let response = state.resolver.resolve(video).await?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_video_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_video_id("not-a-uuid"),
            Err(AppError::BadRequest(_))
        ));
    }
}

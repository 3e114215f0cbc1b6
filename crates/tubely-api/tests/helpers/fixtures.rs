use super::auth::TestUser;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use tubely_core::models::VideoResponse;

/// Prefix the fake normalizer writes, so tests can tell its output from the upload.
pub const FASTSTART_MARKER: &[u8] = b"FASTSTART:";

/// Bytes standing in for an mp4; the fake tools never parse them.
pub fn sample_mp4(len: usize) -> Vec<u8> {
    let mut data = b"\x00\x00\x00\x18ftypmp42".to_vec();
    data.resize(len.max(data.len()), 0xAB);
    data
}

/// The PNG signature followed by filler.
pub fn sample_png(len: usize) -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.resize(len.max(data.len()), 0x42);
    data
}

pub fn file_form(field: &str, file_name: &str, content_type: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        field,
        Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_type(content_type.to_string()),
    )
}

/// Create a draft record owned by `user`.
pub async fn create_video(client: &TestServer, user: &TestUser, title: &str) -> VideoResponse {
    let response = client
        .post("/api/videos")
        .add_header("Authorization", user.bearer())
        .json(&serde_json::json!({ "title": title, "description": "test video" }))
        .await;
    assert_eq!(response.status_code(), 201);
    response.json::<VideoResponse>()
}

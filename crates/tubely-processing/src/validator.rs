use tubely_core::models::MediaKind;
use tubely_core::AppError;

/// Content type validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid Content-Type: {0}")]
    Malformed(String),

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    NotAllowed {
        content_type: String,
        allowed: Vec<String>,
    },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Malformed(raw) => {
                AppError::BadRequest(format!("Invalid Content-Type: {}", raw))
            }
            ValidationError::NotAllowed {
                content_type,
                allowed,
            } => AppError::UnsupportedMediaType {
                content_type,
                allowed,
            },
        }
    }
}

fn is_token(s: &str) -> bool {
    const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii() && !c.is_ascii_control() && c != ' ' && !TSPECIALS.contains(c))
}

/// Parse a Content-Type header value to its lowercased `type/subtype`.
///
/// Parameters are checked for shape and dropped.
pub fn parse_media_type(raw: &str) -> Result<String, ValidationError> {
    let malformed = || ValidationError::Malformed(raw.to_string());

    let mut parts = raw.split(';');
    let essence = parts.next().unwrap_or_default().trim();
    let (main, sub) = essence.split_once('/').ok_or_else(malformed)?;
    if !is_token(main) || !is_token(sub) {
        return Err(malformed());
    }

    for param in parts {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        let (name, _value) = param.split_once('=').ok_or_else(malformed)?;
        if !is_token(name.trim()) {
            return Err(malformed());
        }
    }

    Ok(format!("{}/{}", main, sub).to_lowercase())
}

/// Parse `raw` and check it against the allow-list for `kind`.
pub fn validate_content_type(kind: MediaKind, raw: &str) -> Result<String, ValidationError> {
    let media_type = parse_media_type(raw)?;
    if !kind.allows(&media_type) {
        return Err(ValidationError::NotAllowed {
            content_type: media_type,
            allowed: kind
                .allowed_content_types()
                .iter()
                .map(|ct| ct.to_string())
                .collect(),
        });
    }
    Ok(media_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_type() {
        assert_eq!(parse_media_type("video/mp4").unwrap(), "video/mp4");
        assert_eq!(parse_media_type("Image/PNG").unwrap(), "image/png");
        assert_eq!(
            parse_media_type("image/jpeg; charset=binary").unwrap(),
            "image/jpeg"
        );
        for bad in ["", "video", "/mp4", "video/", "vid eo/mp4", "image/png; bogus"] {
            assert!(parse_media_type(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_allow_list_is_total() {
        let cases = [
            (MediaKind::Video, "video/mp4", true),
            (MediaKind::Video, "video/quicktime", false),
            (MediaKind::Video, "image/png", false),
            (MediaKind::Thumbnail, "image/png", true),
            (MediaKind::Thumbnail, "image/jpeg", true),
            (MediaKind::Thumbnail, "image/webp", false),
            (MediaKind::Thumbnail, "video/mp4", false),
        ];
        for (kind, ct, ok) in cases {
            assert_eq!(validate_content_type(kind, ct).is_ok(), ok, "{kind} {ct}");
        }
    }

    #[test]
    fn test_errors_map_to_app_errors() {
        let err: AppError = validate_content_type(MediaKind::Video, "???").unwrap_err().into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = validate_content_type(MediaKind::Video, "video/webm")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::UnsupportedMediaType { .. }));
    }
}

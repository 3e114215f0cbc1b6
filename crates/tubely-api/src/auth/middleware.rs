use crate::auth::jwt::JwtService;
use crate::auth::models::AuthUser;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tubely_core::AppError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtService,
}

impl AuthState {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            jwt: JwtService::new(jwt_secret),
        }
    }
}

/// `Authorization: Bearer <token>`, or `None` for any other shape.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(header) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return HttpAppError(AppError::Unauthorized("Couldn't find JWT".to_string()))
            .into_response();
    };

    let Some(token) = bearer_token(header) else {
        return HttpAppError(AppError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        ))
        .into_response();
    };

    let user_id = match auth_state.jwt.validate(token) {
        Ok(user_id) => user_id,
        Err(e) => return HttpAppError(e).into_response(),
    };

    tracing::debug!(%user_id, "Request authenticated");
    request.extensions_mut().insert(AuthUser { user_id });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
        assert_eq!(bearer_token("abc"), None);
    }
}

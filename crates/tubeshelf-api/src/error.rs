//! API error types

use axum::http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use tubeshelf_auth::AuthError;
use tubeshelf_db::DbError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Database(DbError::Duplicate(msg))
            | ApiError::Auth(AuthError::Store(DbError::Duplicate(msg))) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            ApiError::Auth(AuthError::VerificationFailed) => (
                StatusCode::FORBIDDEN,
                "AUTHENTICATION_DENIED",
                AuthError::VerificationFailed.to_string(),
            ),
            ApiError::Auth(AuthError::Invalid) => (
                StatusCode::UNAUTHORIZED,
                "ACCESS_DENIED",
                AuthError::Invalid.to_string(),
            ),
            ApiError::Auth(AuthError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
            ApiError::Auth(e) => {
                // Never echo crypto or storage detail to the client
                error!("Authentication backend error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        };

        let body = axum::Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_status_mapping() {
        let denied = ApiError::Auth(AuthError::VerificationFailed).into_response();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        assert!(denied.headers().get(WWW_AUTHENTICATE).is_none());

        let invalid = ApiError::Auth(AuthError::Invalid).into_response();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");

        let bad_input = ApiError::Auth(AuthError::InvalidInput("too long".to_string()));
        assert_eq!(bad_input.into_response().status(), StatusCode::BAD_REQUEST);

        let duplicate = ApiError::Auth(AuthError::Store(DbError::Duplicate("u1".to_string())));
        assert_eq!(duplicate.into_response().status(), StatusCode::CONFLICT);

        let internal = ApiError::Auth(AuthError::Derivation("bad params".to_string()));
        assert_eq!(internal.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let missing = ApiError::NotFound("User: 7".to_string()).into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}

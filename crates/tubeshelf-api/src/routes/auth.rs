//! Authentication extractor and token routes

use axum::{
    Json, Router,
    body::Body,
    extract::{FromRef, FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, request::Parts},
    response::Response,
    routing::post,
};
use tracing::{debug, info};
use tubeshelf_auth::{AuthError, IdentityContext, bearer_token, validate_secret, validate_username};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::LoginRequest;

// ==================== Auth Extractors ====================

/// Extractor for an authenticated caller (required)
///
/// Role checks are left to the handler that receives the identity.
pub struct RequireAuth(pub IdentityContext);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let identity = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::Invalid)
            .and_then(bearer_token)
            .and_then(|token| app_state.auth.authenticate(token))
            .inspect_err(|_| metrics::counter!("tubeshelf_token_rejections_total").increment(1))?;

        debug!("Authenticated user: {} ({})", identity.username, identity.role);
        Ok(RequireAuth(identity))
    }
}

// ==================== Auth Routes ====================

/// Verify credentials and answer with the raw token bytes
async fn issue_token(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Response, ApiError> {
    validate_username(username)?;
    validate_secret(password)?;

    debug!("Token request for user: {}", username);

    match state.auth.login(username, password).await {
        Ok(token) => {
            metrics::counter!("tubeshelf_login_attempts_total", "outcome" => "success")
                .increment(1);
            info!("User {} authenticated", username);
            Ok(Response::new(Body::from(token.into_bytes())))
        }
        Err(e) => {
            let outcome = if e.is_denial() { "denied" } else { "error" };
            metrics::counter!("tubeshelf_login_attempts_total", "outcome" => outcome)
                .increment(1);
            Err(e.into())
        }
    }
}

/// POST /auth
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    issue_token(&state, &request.username, &request.password).await
}

/// POST /auth/{username}/{password}
async fn login_with_path(
    State(state): State<AppState>,
    Path((username, password)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    issue_token(&state, &username, &password).await
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth", post(login))
        .route("/auth/{username}/{password}", post(login_with_path))
}

//! User credential routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::{debug, info};
use tubeshelf_auth::{IdentityContext, NewCredential, validate_name};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{CreateUserRequest, UpdateUserRequest, UserResponse};

/// GET /users
async fn list_users(
    _caller: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.db.list_users().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /users
async fn create_user(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let credential = NewCredential::new(request.username, request.name, request.password)?;

    debug!("User {} creating user: {}", caller.username, credential.username);

    let record = state.auth.register(credential).await?;

    info!("Created user: {}", record.username);

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /users/me
async fn current_user(RequireAuth(identity): RequireAuth) -> Json<IdentityContext> {
    Json(identity)
}

/// GET /users/{id}
async fn get_user(
    _caller: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    Ok(Json(user.into()))
}

/// PATCH /users/{id}
async fn update_user(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_name(&request.name)?;

    debug!("User {} renaming user: {}", caller.username, id);

    if !state.db.update_user_name(id, &request.name).await? {
        return Err(ApiError::NotFound(format!("User: {}", id)));
    }

    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    info!("Updated user: {}", user.username);

    Ok(Json(user.into()))
}

/// DELETE /users/{id}
async fn delete_user(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    debug!("User {} deleting user: {}", caller.username, id);

    if state.db.delete_user(id).await? {
        info!("Deleted user: {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("User: {}", id)))
    }
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(current_user))
        .route("/users/{id}", get(get_user).patch(update_user).delete(delete_user))
}

//! API routes

mod auth;
pub mod metrics;
mod status;
mod types;
mod users;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

pub use auth::RequireAuth;
pub use types::{CreateUserRequest, LoginRequest, UpdateUserRequest, UserResponse};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(status::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .with_state(state)
        // Credential payloads are tiny
        .layer(DefaultBodyLimit::max(16 * 1024));

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}

//! Liveness endpoint

use axum::{Router, routing::get};

use crate::state::AppState;

/// GET /status
async fn status() -> &'static str {
    metrics::counter!("tubeshelf_status_checks_total").increment(1);

    "API is up and running"
}

/// Create status routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/status", get(status))
}

//! Tubeshelf REST API
//!
//! This crate provides the Axum-based HTTP surface around the
//! authentication core: token issuance, credential creation, and the
//! bearer-token extractor used by protected routes.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{RequireAuth, create_router};
pub use state::{AppState, MetricsHandle};

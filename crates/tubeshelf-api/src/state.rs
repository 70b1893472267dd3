//! Application state

use tubeshelf_auth::AuthService;
use tubeshelf_db::Database;

/// Prometheus render handle installed by the binary
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(db: Database, auth: AuthService) -> Self {
        Self { db, auth }
    }
}

//! Tubeshelf - credential and token service

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LoggingConfig};
use tubeshelf_api::{AppState, create_router};
use tubeshelf_auth::{AuthService, NewCredential};
use tubeshelf_db::Database;

/// Tubeshelf - credential and token service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "TUBESHELF_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "TUBESHELF_PORT")]
    port: Option<u16>,

    /// Token signing secret
    #[arg(long, env = "TUBESHELF_AUTH_SECRET", hide_env_values = true)]
    auth_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    config.override_secret(args.auth_secret);

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting Tubeshelf v{}", env!("CARGO_PKG_VERSION"));

    let auth_config = config.auth_config()?;
    if auth_config.token_ttl_secs().is_none() {
        warn!("auth.token_ttl_secs is not set; issued tokens never expire");
    }

    // Create data directory
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // Initialize database
    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path).await?;

    bootstrap_admin(&db, &config).await?;

    let metrics_handle = setup_metrics()?;

    // Create application state
    let auth = AuthService::new(Arc::new(db.clone()), &auth_config);
    let state = AppState::new(db, auth);

    // Create router
    let app = create_router(state, Some(Arc::new(metrics_handle)))
        .layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Create the configured administrator on an empty database
async fn bootstrap_admin(db: &Database, config: &Config) -> Result<()> {
    let Some(admin) = &config.auth.bootstrap_admin else {
        if !db.has_users().await? {
            warn!("No users exist and auth.bootstrap_admin is not configured");
        }
        return Ok(());
    };

    let credential = NewCredential::new(
        admin.username.clone(),
        admin.name.clone(),
        admin.password.clone(),
    )
    .context("Invalid auth.bootstrap_admin")?;

    if let Some(record) = tubeshelf_auth::bootstrap_admin(db, credential).await? {
        info!("Bootstrap admin user created (username: {})", record.username);
    }

    Ok(())
}

/// Install the Prometheus recorder
fn setup_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!("tubeshelf_status_checks_total", "Total liveness checks served");
    metrics::describe_counter!(
        "tubeshelf_login_attempts_total",
        "Credential verification attempts by outcome"
    );
    metrics::describe_counter!(
        "tubeshelf_token_rejections_total",
        "Bearer tokens refused on protected routes"
    );

    Ok(handle)
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootstrapAdmin;
    use tubeshelf_auth::{ADMIN_ROLE, AuthConfig, CredentialStore};

    fn config_with_admin(username: &str) -> Config {
        let mut config = Config::default();
        config.auth.bootstrap_admin = Some(BootstrapAdmin {
            username: username.to_string(),
            name: "Administrator".to_string(),
            password: "change-me".to_string(),
        });
        config
    }

    #[tokio::test]
    async fn test_bootstrap_admin_on_empty_database() {
        let db = Database::in_memory().await.unwrap();
        bootstrap_admin(&db, &config_with_admin("admin")).await.unwrap();

        let auth = AuthService::new(Arc::new(db.clone()), &AuthConfig::new("secret").unwrap());
        let token = auth.login("admin", "change-me").await.unwrap();
        let identity = auth.authenticate(token.as_str()).unwrap();
        assert_eq!(identity.username, "admin");
        assert_eq!(identity.name, "Administrator");
        assert_eq!(identity.role, ADMIN_ROLE);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_skipped_when_users_exist() {
        let db = Database::in_memory().await.unwrap();
        db.create(NewCredential::new("u1", "", "pw").unwrap())
            .await
            .unwrap();

        bootstrap_admin(&db, &config_with_admin("admin")).await.unwrap();

        assert!(db.lookup("admin").await.unwrap().is_none());
        assert_eq!(db.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_not_configured() {
        let db = Database::in_memory().await.unwrap();
        bootstrap_admin(&db, &Config::default()).await.unwrap();

        assert!(!db.has_users().await.unwrap());
    }

    #[tokio::test]
    async fn test_bootstrap_admin_rejects_unusable_username() {
        let db = Database::in_memory().await.unwrap();
        let long = "a".repeat(tubeshelf_auth::MAX_USERNAME_LENGTH + 1);

        assert!(bootstrap_admin(&db, &config_with_admin(&long)).await.is_err());
        assert!(!db.has_users().await.unwrap());
    }
}

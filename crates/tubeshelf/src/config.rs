//! Configuration loading

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use tubeshelf_auth::AuthConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Default, Deserialize)]
pub struct AuthSettings {
    /// Token signing secret; `TUBESHELF_AUTH_SECRET` takes precedence
    #[serde(default)]
    pub secret: Option<String>,
    /// Token lifetime in seconds; tokens never expire when unset
    #[serde(default)]
    pub token_ttl_secs: Option<u32>,
    /// Administrator created on first start when the database is empty
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

/// Bootstrap administrator credentials
#[derive(Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    #[serde(default)]
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./data/tubeshelf.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Replace the file secret with one supplied from the environment
    pub fn override_secret(&mut self, secret: Option<String>) {
        if secret.is_some() {
            self.auth.secret = secret;
        }
    }

    /// Build the signing configuration, failing when no usable secret exists
    pub fn auth_config(&self) -> Result<AuthConfig> {
        let secret = self
            .auth
            .secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .context("No token signing secret configured; set TUBESHELF_AUTH_SECRET")?;

        let config = AuthConfig::new(secret)?;
        Ok(match self.auth.token_ttl_secs {
            Some(ttl) => config.with_token_ttl(ttl),
            None => config,
        })
    }
}

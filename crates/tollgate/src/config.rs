//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tollgate_auth::{DEFAULT_SESSION_COOKIE, PasswordParams, TokenConfig};
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub password: PasswordParams,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
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
#[derive(Debug, Clone, Serialize, Deserialize)]
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
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
    /// Mark the session cookie `Secure` (HTTPS only)
    #[serde(default)]
    pub cookie_secure: bool,
    /// Account created at startup when the user table is empty
    #[serde(default)]
    pub bootstrap_email: Option<String>,
    #[serde(default)]
    pub bootstrap_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            algorithm: default_algorithm(),
            cookie_name: default_cookie_name(),
            token_ttl_minutes: default_token_ttl_minutes(),
            cookie_secure: false,
            bootstrap_email: None,
            bootstrap_password: None,
        }
    }
}

/// Minimum token lifetime (1 minute)
const MIN_TOKEN_TTL_MINUTES: i64 = 1;

/// Maximum token lifetime (30 days)
const MAX_TOKEN_TTL_MINUTES: i64 = 30 * 24 * 60;

impl AuthConfig {
    /// Token lifetime clamped to [1 minute, 30 days], warning if adjusted
    pub fn validated_ttl_minutes(&self) -> i64 {
        if self.token_ttl_minutes < MIN_TOKEN_TTL_MINUTES {
            warn!(
                "token_ttl_minutes {} is below minimum {}, using minimum",
                self.token_ttl_minutes, MIN_TOKEN_TTL_MINUTES
            );
            MIN_TOKEN_TTL_MINUTES
        } else if self.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            warn!(
                "token_ttl_minutes {} exceeds maximum {}, using maximum",
                self.token_ttl_minutes, MAX_TOKEN_TTL_MINUTES
            );
            MAX_TOKEN_TTL_MINUTES
        } else {
            self.token_ttl_minutes
        }
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt_secret.clone(),
            algorithm: self.algorithm.clone(),
        }
    }

    /// Bootstrap credentials, if both halves are configured
    pub fn bootstrap_account(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_email, &self.bootstrap_password) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some((email.as_str(), password.as_str()))
            }
            (None, None) => None,
            _ => {
                warn!("Ignoring bootstrap account: both bootstrap_email and bootstrap_password are required");
                None
            }
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
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

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8002
}

fn default_db_path() -> String {
    "./data/tollgate.db".to_string()
}

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_cookie_name() -> String {
    DEFAULT_SESSION_COOKIE.to_string()
}

fn default_token_ttl_minutes() -> i64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
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

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("auth.jwt_secret must not be empty");
        }
        if self.auth.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("auth.jwt_secret is the built-in default; set TOLLGATE_JWT_SECRET in production");
        }
        if self.auth.cookie_name.is_empty() {
            anyhow::bail!("auth.cookie_name must not be empty");
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            anyhow::bail!("logging.format must be \"pretty\" or \"json\", got {:?}", self.logging.format);
        }
        Ok(())
    }
}

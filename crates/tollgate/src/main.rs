//! Tollgate - cookie-session authentication service

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{AuthConfig, Config, LoggingConfig};
use tollgate_api::{AppState, create_router};
use tollgate_auth::{PasswordHasher, SessionCookie, TokenSigner};
use tollgate_db::{Database, NewUser};

/// Tollgate - cookie-session authentication service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "TOLLGATE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "TOLLGATE_PORT")]
    port: Option<u16>,

    /// Token signing secret (overrides the config file)
    #[arg(long, env = "TOLLGATE_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(secret) = args.jwt_secret {
        config.auth.jwt_secret = secret;
    }

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting Tollgate v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;

    // Create data directory
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }

    // Initialize database
    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path).await?;

    // Signing and hashing configuration is fixed for the process lifetime
    let signer = Arc::new(
        TokenSigner::new(&config.auth.token_config())
            .context("Invalid token signing configuration")?,
    );
    let hasher = Arc::new(
        PasswordHasher::new(config.password).context("Invalid password hashing configuration")?,
    );
    info!("Signing session tokens with {:?}", signer.algorithm());

    bootstrap_account(&db, &hasher, &config.auth).await?;

    let session = SessionCookie::new(
        config.auth.cookie_name.clone(),
        Duration::minutes(config.auth.validated_ttl_minutes()),
        config.auth.cookie_secure,
    );

    // Install the Prometheus recorder before any metric is touched
    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    // Create application state
    let state = AppState::new(db, signer, hasher, session);

    // Create router
    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

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

/// Create the configured bootstrap account if no users exist
async fn bootstrap_account(db: &Database, hasher: &PasswordHasher, auth: &AuthConfig) -> Result<()> {
    let Some((email, password)) = auth.bootstrap_account() else {
        return Ok(());
    };
    if db.has_users().await? {
        return Ok(());
    }

    info!("Creating bootstrap account {}", email);
    let password_hash = hasher.hash(password)?;
    db.insert_user(NewUser {
        email: email.to_string(),
        password_hash,
    })
    .await?;
    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_auth::PasswordParams;

    async fn temp_database() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("main.db").display());
        (Database::new(&url).await.unwrap(), dir)
    }

    fn cheap_hasher() -> PasswordHasher {
        PasswordHasher::new(PasswordParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_account_created_once() {
        let (db, _dir) = temp_database().await;
        let hasher = cheap_hasher();
        let auth = AuthConfig {
            bootstrap_email: Some("admin@example.com".to_string()),
            bootstrap_password: Some("changeme".to_string()),
            ..AuthConfig::default()
        };

        bootstrap_account(&db, &hasher, &auth).await.unwrap();
        let admin = db.get_user_by_email("admin@example.com").await.unwrap().unwrap();
        assert!(hasher.verify("changeme", &admin.password_hash).unwrap());

        // A second start must not fail on the existing account
        bootstrap_account(&db, &hasher, &auth).await.unwrap();
    }

    #[tokio::test]
    async fn test_bootstrap_skipped_without_credentials() {
        let (db, _dir) = temp_database().await;

        bootstrap_account(&db, &cheap_hasher(), &AuthConfig::default())
            .await
            .unwrap();
        assert!(!db.has_users().await.unwrap());
    }
}

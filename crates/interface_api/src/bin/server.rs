//! Poultry POS - API Server Binary
//!
//! Starts the HTTP server in front of the ledger services.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin poultry-pos
//!
//! # Run with environment variables
//! POS_HOST=0.0.0.0 POS_PORT=8080 POS_DATABASE_URL=postgres://... cargo run --bin poultry-pos
//! ```
//!
//! # Environment Variables
//!
//! * `POS_HOST` - Server host (default: 127.0.0.1)
//! * `POS_PORT` - Server port (default: 8080)
//! * `POS_DATABASE_URL` - PostgreSQL connection string
//! * `POS_MAX_CONNECTIONS` / `POS_MIN_CONNECTIONS` - Pool bounds
//! * `POS_LOG_LEVEL` - Log level or filter directive (default: info)
//! * `POS_LOG_FORMAT` - `pretty` or `json`
//! * `POS_TIMEZONE` - IANA timezone of the facility (default: Asia/Amman)
//! * `POS_SETTINGS_PATH` - Preferences file (default: settings/app-settings.json)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::SystemClock;
use infra_db::{create_pool, run_migrations, PgUnitOfWorkProvider};
use interface_api::config::{ApiConfig, LogFormat};
use interface_api::settings::SettingsStore;
use interface_api::{create_router, AppState};

/// Main entry point for the API server.
///
/// Loads configuration, initializes logging, connects and migrates the
/// database, loads the operator settings and serves until a shutdown signal.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid POS_* configuration")?;
    init_tracing(&config.log_level, config.log_format);

    let timezone = config
        .business_timezone()
        .with_context(|| format!("unknown timezone {}", config.timezone))?;

    tracing::info!(
        host = %config.host,
        port = %config.port,
        timezone = timezone.name(),
        "Starting Poultry POS API Server"
    );

    let pool = create_pool(config.database())
        .await
        .context("cannot connect to the database")?;
    run_migrations(&pool).await.context("migrations failed")?;

    let provider = Arc::new(PgUnitOfWorkProvider::new(pool));
    let clock = Arc::new(SystemClock::new(timezone));
    let settings = SettingsStore::load(&config.settings_path).await;

    let app = create_router(AppState::new(provider, clock, settings));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server_addr()))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().with_target(true)).init(),
    }
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

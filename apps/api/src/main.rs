//! # Mesa API server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Mesa API Server                                │
//! │                                                                         │
//! │  Back office ───► HTTP (8080) ───► Routes ───► SQLite (mesa.db)        │
//! │                                       │                                 │
//! │  Processor  ───► /api/pagos/webhook   ▼                                 │
//! │                                 Payment gateway                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mesa_api::gateway::MercadoPagoGateway;
use mesa_api::{router, AppConfig, AppState};
use mesa_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Mesa API server...");
    info!(
        port = config.server.port,
        database = %config.database.path.display(),
        webhook_signed = config.payments.webhook_secret.is_some(),
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections),
    )
    .await
    .context("opening database")?;

    let gateway = MercadoPagoGateway::new(
        &config.payments.api_base_url,
        Duration::from_secs(config.payments.timeout_secs),
    )?;

    let addr = config.bind_address()?;
    let state = AppState::new(db.clone(), config, Arc::new(gateway));
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

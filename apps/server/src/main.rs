//! # Kiosk POS Server Binary
//!
//! Wires configuration, the database and the router together and serves
//! HTTP until shutdown.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kiosk_db::{Database, DbConfig};
use kiosk_server::routes;
use kiosk_server::{auth, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Kiosk POS server...");

    let config = ServerConfig::load().context("loading configuration")?;
    let report_offset = config.report_offset().context("resolving report offset")?;
    info!(
        bind_addr = %config.bind_addr,
        database = %config.database_path,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .context("connecting to database")?;
    info!("Database ready");

    // A fresh deployment gets a first admin to log in with
    auth::ensure_admin(&db, &config)
        .await
        .context("provisioning bootstrap admin")?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(db, config, report_offset);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(addr = %bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::error!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => {
                tracing::error!("Failed to install SIGTERM handler");
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

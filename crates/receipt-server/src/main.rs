//! receipt-server - REST API server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use receipt_core::ReceiptConfig;
use receipt_server::{create_server, AppState};
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
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
}

/// `RECEIPT_CONFIG` file if set, then `RECEIPT_*` overrides.
fn load_config() -> Result<ReceiptConfig> {
    let mut config = match std::env::var("RECEIPT_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            ReceiptConfig::from_file(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
        Err(_) => ReceiptConfig::default(),
    };
    config
        .apply_env()
        .context("invalid RECEIPT_* override")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("receipt_server=debug".parse()?),
        )
        .init();

    let config = load_config()?;
    info!(
        engine = ?config.ocr.engine,
        mode = %config.extraction.mode,
        "Loaded configuration"
    );

    let state = AppState::from_config(&config).context("failed to initialize services")?;
    info!("Services initialized");

    let app = create_server(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Starting receipt-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}

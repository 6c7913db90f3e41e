//! Florascope
//!
//! Downloads the flower classifier on first start, then serves an upload page
//! and a `POST /analyze` endpoint that returns the predicted species.

use anyhow::{Context, Result};
use clap::Parser;
use florascope_model::{bootstrap, ensure_artifact};
use florascope_server::cli::{Cli, Commands};
use florascope_server::telemetry::{init_metrics, init_tracing};
use florascope_server::{build_app, run_server, AppState, ServerConfig};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut config = ServerConfig::load(&cli.config)?;

    match cli.command {
        Commands::Serve { host, port, model } => {
            config.apply_overrides(host, port, &model);
            serve(config).await
        }
        Commands::Fetch { model } => {
            config.apply_overrides(None, None, &model);
            let path = ensure_artifact(&config.model.artifact)
                .await
                .context("failed to provision model artifact")?;
            info!("Model artifact available at {}", path.display());
            Ok(())
        }
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    info!("Starting Florascope");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let metrics_handle = init_metrics()?;

    // Nothing listens until the model is on disk and loaded.
    let predictor = match bootstrap(&config.model).await {
        Ok(predictor) => predictor,
        Err(e) => {
            error!("Model bootstrap failed: {}", e);
            return Err(e).context("refusing to start without a working model");
        }
    };

    let state = AppState::new(predictor).with_metrics(metrics_handle);
    let app = build_app(state, config.max_upload_bytes);

    run_server(app, addr, shutdown_signal()).await
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received, stopping server...");
}

//! ClickSync Server (clicksync-server) - Main entry point
//!
//! Serves the click scheduler control API, the SSE event stream and the
//! calibration store over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use clicksync_common::clock::MonotonicClock;
use clicksync_common::config::{ensure_data_folder, resolve_data_folder, TomlConfig};
use clicksync_server::calibration::CalibrationStore;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "clicksync_server=debug,clicksync_common=info,tower_http=debug";

/// Command-line arguments for clicksync-server
#[derive(Parser, Debug)]
#[command(name = "clicksync-server")]
#[command(about = "Synchronized click scheduler and calibration store")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the configuration file)
    #[arg(short, long, env = "CLICKSYNC_PORT")]
    port: Option<u16>,

    /// Folder holding the calibration file
    #[arg(short, long)]
    data_folder: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "CLICKSYNC_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration comes first: it may carry the log filter
    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG > [logging] level > built-in default
    let fallback_filter = config
        .logging
        .level
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting ClickSync server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );

    let port = args.port.unwrap_or(config.port);
    let data_folder = resolve_data_folder(args.data_folder.as_deref(), &config);

    let store = match ensure_data_folder(&data_folder) {
        Ok(_) => CalibrationStore::load(config.calibration_path(&data_folder)),
        Err(e) => {
            error!(
                "Data folder {} unusable, calibration will not persist: {}",
                data_folder.display(),
                e
            );
            CalibrationStore::in_memory()
        }
    }
    .with_max_match_distance(config.calibration.max_match_distance);

    if let Some(max) = config.calibration.max_match_distance {
        info!("Fuzzy device matching limited to distance {}", max);
    }

    let clock = Arc::new(MonotonicClock::new());
    let (ctx, scheduler_task) =
        clicksync_server::start_services(&config.scheduler, store, clock);
    let scheduler = ctx.scheduler.clone();

    let served = clicksync_server::api::run(port, ctx, shutdown_signal()).await;

    scheduler.shutdown().await;
    if let Err(e) = scheduler_task.await {
        warn!("Scheduler task ended abnormally: {}", e);
    }

    served.context("HTTP server failed")?;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

//! Snowfall dashboard server.
//!
//! HTTP server for the probabilistic snowfall dashboard.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use snow_dashboard::{build_router, AppState, DashboardConfig};

#[derive(Parser, Debug)]
#[command(name = "snow-dashboard")]
#[command(about = "Probabilistic snowfall forecast dashboard")]
struct Args {
    /// Listen address
    #[arg(short, long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Dashboard configuration file (YAML); built-in defaults when absent
    #[arg(short, long, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the forecast files
    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Entries per memo cache
    #[arg(long, env = "CACHE_ENTRIES")]
    cache_entries: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Prometheus metrics exporter initialized");

    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(entries) = args.cache_entries {
        config.cache_entries = entries;
    }

    netcdf_parser::silence_hdf5_errors();

    info!(
        title = %config.title,
        data_dir = %config.data_dir.display(),
        "Starting snowfall dashboard"
    );

    // Initialize application state
    let state = Arc::new(AppState::new(config, Some(prometheus_handle))?);
    let app = build_router(state);

    // Parse listen address
    let addr: SocketAddr = args.listen.parse()?;
    info!(address = %addr, "Listening");

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

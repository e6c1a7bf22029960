//! Vital-signs monitoring backend - entry point.
//!
//! Wires the broker gateway, ingestion pipeline, store, detector engine,
//! and HTTP API together and runs until interrupted.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Vital-signs monitoring backend
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via VITALS_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    vitals_telemetry::init_logging()?;

    info!("Starting vitals backend v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .or_else(|| std::env::var("VITALS_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = vitals_server::AppConfig::load(&config_path)?;

    vitals_server::run(config).await
}

//! TWAP sell-volume bot - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// TWAP sell-volume bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TWAP_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > TWAP_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("TWAP_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = twap_bot::AppConfig::from_file(&config_path)?;

    twap_telemetry::init_logging(Some(&config.telemetry.log_level))?;
    info!("Starting TWAP Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        num_hours_to_sell = config.twap.num_hours_to_sell,
        parent_bucket_size_seconds = config.twap.parent_bucket_size_seconds,
        "Configuration loaded"
    );

    let app = twap_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}

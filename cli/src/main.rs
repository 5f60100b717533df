//! `futsal` binary entry point.

use anyhow::Result;
use clap::Parser;
use futsal_booking_cli::{Cli, Config};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();

    if let Some(addr) = config.metrics_addr {
        futsal_booking_runtime::metrics::install_exporter(addr)?;
    }

    futsal_booking_cli::run(cli, &config).await
}

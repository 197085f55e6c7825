//! Dropwatch - Main Entry Point
//!
//! Loads the instrument list and thresholds, then polls Yahoo Finance on a
//! fixed cadence and prints drop alerts and periodic summaries.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dropwatch::config::{load_config, InstrumentConfig};
use dropwatch::{ConsoleSink, PollCycle, Scheduler, StateStore, YahooChartClient};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "DROPWATCH_CONFIG")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Comma-separated instruments as SYMBOL or SYMBOL=Name; replaces the configured list
    #[arg(long)]
    symbols: Option<String>,

    /// Preload, run one sweep, print one summary and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let mut config = load_config(Some(args.config.as_str()))?;
    if let Some(symbols) = &args.symbols {
        config.instruments = symbols.split(',').filter_map(InstrumentConfig::parse).collect();
    }
    if let Some(level) = &args.log_level {
        config.settings.log_level = level.clone();
    }

    init_logging(&config.settings.log_level, args.log_format)?;

    info!("Starting dropwatch");
    info!("Configuration file: {}", args.config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Refusing to start");
        return Err(e.into());
    }

    let instruments = config.instruments();
    let client = YahooChartClient::from_config(&config.market_data)?;
    let sink = ConsoleSink::new(config.settings.currency_symbol.clone());

    let cycle = PollCycle::new(
        instruments,
        Arc::new(client),
        Arc::new(StateStore::new()),
        Arc::new(sink),
        config.alerts,
    )
    .with_fetch_timeout(config.market_data.request_timeout())
    .with_max_concurrent_fetches(config.market_data.max_concurrent_fetches);

    let mut scheduler = Scheduler::new(cycle, config.schedule);

    if args.once {
        scheduler.run_once().await;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, finishing current sweep...");
    shutdown_tx.send_replace(true);

    handle.await?;
    info!("Shutdown complete");

    Ok(())
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!(e))
}

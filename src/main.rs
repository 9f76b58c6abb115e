//! metric-push - push exporter daemon
//!
//! Periodically pushes every series in the metric store to the configured
//! collectd, graphite and statsd targets.
//!
//! # Usage
//! ```sh
//! GRAPHITE_HOSTPORT=localhost:2003 cargo run -- --push-interval-seconds 10
//! metric-push --config /etc/metric-push.toml
//! ```
//!
//! # Environment Variables
//! - `PUSH_INTERVAL_SECONDS` - Seconds between pushes (default: 60)
//! - `PUSH_WRITE_DEADLINE_MS` - Dial timeout and write deadline (default: 10000)
//! - `PUSH_HOSTNAME` - Hostname used in collectd lines
//! - `COLLECTD_SOCKETPATH`, `GRAPHITE_HOSTPORT`, `STATSD_HOSTPORT` - Enable a backend
//! - `COLLECTD_PREFIX`, `GRAPHITE_PREFIX`, `STATSD_PREFIX` - Metric path prefixes

use anyhow::{Context, Result};
use clap::Parser;
use metric_push::application::exporter::{Exporter, ExporterOptions, StatusReporter};
use metric_push::config::Config;
use metric_push::domain::metrics::Store;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Push metrics to collectd, graphite and statsd", long_about = None)]
struct Cli {
    /// TOML config file; environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between pushes
    #[arg(long)]
    push_interval_seconds: Option<u64>,

    /// Dial timeout and write deadline in milliseconds
    #[arg(long)]
    write_deadline_ms: Option<u64>,

    /// Hostname used in collectd lines
    #[arg(long)]
    hostname: Option<String>,

    /// Seconds between export status reports (0 disables)
    #[arg(long)]
    status_interval_seconds: Option<u64>,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env()?;

        if let Some(seconds) = self.push_interval_seconds {
            config.push_interval_seconds = seconds;
        }
        if let Some(ms) = self.write_deadline_ms {
            config.write_deadline_ms = ms;
        }
        if let Some(hostname) = &self.hostname {
            config.hostname = Some(hostname.clone());
        }
        if let Some(seconds) = self.status_interval_seconds {
            config.status_interval_seconds = seconds;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("metric-push {} starting...", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = cli.load_config()?;
    info!(
        "Configuration loaded: interval={:?}, write_deadline={:?}, targets={}",
        config.push_interval(),
        config.write_deadline(),
        config.enabled_targets().count()
    );

    // Producers populate the store; this process only exports it
    let store = Arc::new(Store::new());
    let mut exporter = Exporter::new(ExporterOptions::from_config(&config, store))
        .context("Failed to build exporter")?;
    for target in &config.targets {
        exporter.register_target(target);
    }
    let exporter = Arc::new(exporter);

    let push_handle = exporter.clone().start_metric_push();
    if push_handle.is_none() {
        warn!("No push targets configured. Nothing will be exported.");
    }

    if let Some(interval) = config.status_interval() {
        let reporter = StatusReporter::new(exporter.clone(), interval);
        tokio::spawn(async move {
            reporter.run().await;
        });
        info!("Status reporter started (interval: {:?})", interval);
    }

    info!("Running. Press Ctrl+C to shutdown.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting...");

    if let Some(handle) = push_handle {
        handle.abort();
    }
    match serde_json::to_string(&exporter.status()) {
        Ok(json) => info!("Final export status: {}", json),
        Err(e) => warn!("Failed to serialize export status: {}", e),
    }

    Ok(())
}

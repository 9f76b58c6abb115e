//! Export status snapshots and the periodic status reporter.
//!
//! The reporter only writes to stdout and the log. It never accepts requests.

use super::Exporter;
use crate::domain::ports::NetworkKind;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Counters of one push target at a point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetStatus {
    pub name: String,
    pub network: NetworkKind,
    pub address: String,
    pub export_total: u64,
    pub export_success: u64,
}

/// Exporter-wide view for status pages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportStatus {
    pub hostname: String,
    pub push_interval_seconds: u64,
    pub targets: Vec<TargetStatus>,
}

/// Status snapshot for JSON output
#[derive(Serialize)]
pub struct StatusSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub export: ExportStatus,
}

/// Outputs export status as structured JSON on a fixed interval
pub struct StatusReporter {
    exporter: Arc<Exporter>,
    start_time: Instant,
    interval: Duration,
}

impl StatusReporter {
    pub fn new(exporter: Arc<Exporter>, interval: Duration) -> Self {
        Self {
            exporter,
            start_time: Instant::now(),
            interval,
        }
    }

    /// Run the reporter in a loop, outputting status periodically
    pub async fn run(self) {
        info!(
            "StatusReporter: Starting export status output (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            let snapshot = self.collect_snapshot();
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    // Prefix lets log shippers pick the line out of stdout
                    println!("EXPORT_STATUS_JSON:{}", json);
                    for target in &snapshot.export.targets {
                        info!(
                            "StatusReporter: {} attempted={} succeeded={}",
                            target.name, target.export_total, target.export_success
                        );
                    }
                }
                Err(e) => warn!("Failed to serialize export status: {}", e),
            }
        }
    }

    pub fn collect_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            export: self.exporter.status(),
        }
    }
}

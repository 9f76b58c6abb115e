//! Push exporter
//!
//! Every tick the exporter walks the metric store once per target and writes
//! one rendered line per label set over a fresh connection. Each target is
//! fail-soft: a dial, write or close error is logged and the next target is
//! still pushed. The next tick is the only retry.

pub mod status;
pub mod target;

pub use status::{ExportStatus, StatusReporter, StatusSnapshot, TargetStatus};
pub use target::PushTarget;

use crate::config::{
    Config, MAX_PUSH_INTERVAL_SECONDS, MAX_WRITE_DEADLINE_MS, TargetConfig,
};
use crate::domain::errors::ExportError;
use crate::domain::metrics::Store;
use crate::domain::ports::{Connection, Dialer, NetworkKind};
use crate::infrastructure::formats::{LineFormatter, create_formatter};
use crate::infrastructure::network::SocketDialer;
use crate::infrastructure::observability::ExportMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

const MAX_PUSH_INTERVAL: Duration = Duration::from_secs(MAX_PUSH_INTERVAL_SECONDS);
const MAX_WRITE_DEADLINE: Duration = Duration::from_millis(MAX_WRITE_DEADLINE_MS);

/// Construction parameters for an [`Exporter`]
#[derive(Debug, Clone)]
pub struct ExporterOptions {
    /// Required
    pub store: Option<Arc<Store>>,
    /// Resolved from the OS when unset
    pub hostname: Option<String>,
    pub push_interval: Duration,
    /// Dial timeout and absolute write deadline per connection
    pub write_deadline: Duration,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            store: None,
            hostname: None,
            push_interval: Duration::from_secs(60),
            write_deadline: Duration::from_secs(10),
        }
    }
}

impl ExporterOptions {
    pub fn from_config(config: &Config, store: Arc<Store>) -> Self {
        Self {
            store: Some(store),
            hostname: config.hostname.clone(),
            push_interval: config.push_interval(),
            write_deadline: config.write_deadline(),
        }
    }
}

/// Pushes the contents of a metric store to registered targets
pub struct Exporter {
    store: Arc<Store>,
    hostname: String,
    push_interval: Duration,
    write_deadline: Duration,
    dialer: Arc<dyn Dialer>,
    export_metrics: ExportMetrics,
    targets: Vec<PushTarget>,
}

impl Exporter {
    pub fn new(options: ExporterOptions) -> Result<Self, ExportError> {
        let store = options.store.ok_or_else(|| ExportError::Configuration {
            reason: "exporter needs a store".to_string(),
        })?;
        if options.push_interval.is_zero() || options.push_interval > MAX_PUSH_INTERVAL {
            return Err(ExportError::Configuration {
                reason: format!(
                    "push interval must be between 1s and {:?}, got {:?}",
                    MAX_PUSH_INTERVAL, options.push_interval
                ),
            });
        }
        if options.write_deadline.is_zero() || options.write_deadline > MAX_WRITE_DEADLINE {
            return Err(ExportError::Configuration {
                reason: format!(
                    "write deadline must be between 1ms and {:?}, got {:?}",
                    MAX_WRITE_DEADLINE, options.write_deadline
                ),
            });
        }
        let hostname = resolve_hostname(options.hostname)?;
        let export_metrics = ExportMetrics::new().map_err(|e| ExportError::Configuration {
            reason: format!("registering export counters: {}", e),
        })?;

        Ok(Self {
            store,
            hostname,
            push_interval: options.push_interval,
            write_deadline: options.write_deadline,
            dialer: Arc::new(SocketDialer::new()),
            export_metrics,
            targets: Vec::new(),
        })
    }

    /// Replace the socket dialer, e.g. with an in-memory one
    pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = dialer;
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn push_interval(&self) -> Duration {
        self.push_interval
    }

    pub fn targets(&self) -> &[PushTarget] {
        &self.targets
    }

    pub fn export_metrics(&self) -> &ExportMetrics {
        &self.export_metrics
    }

    /// Append a target and return the name it was registered under. Targets
    /// are pushed in registration order.
    ///
    /// A name that is already taken gets a numeric suffix so each target keeps
    /// its own counters.
    pub fn register_push_export(
        &mut self,
        name: &str,
        network: NetworkKind,
        address: &str,
        formatter: Box<dyn LineFormatter>,
    ) -> String {
        let name = self.unique_name(name);
        let counters = self.export_metrics.target_counters(&name);
        info!(
            "Exporter: registered push target {} ({} {})",
            name, network, address
        );
        self.targets.push(PushTarget::new(
            name.clone(),
            network,
            address,
            formatter,
            counters,
        ));
        name
    }

    /// Register a configured target; returns false when it has no address or
    /// its format cannot be framed on its network
    pub fn register_target(&mut self, target: &TargetConfig) -> bool {
        if !target.is_enabled() {
            debug!(
                "Exporter: target {} has no address, skipping",
                target.name()
            );
            return false;
        }
        if let Err(e) = target.validate() {
            warn!("Exporter: skipping target {}: {}", target.name(), e);
            return false;
        }
        let formatter = create_formatter(
            target.format,
            &target.format_settings(self.push_interval),
        );
        self.register_push_export(target.name(), target.network(), target.address(), formatter);
        true
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |candidate: &str| self.targets.iter().any(|t| t.name() == candidate);
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !taken(candidate.as_str()))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn status(&self) -> ExportStatus {
        ExportStatus {
            hostname: self.hostname.clone(),
            push_interval_seconds: self.push_interval.as_secs(),
            targets: self.targets.iter().map(PushTarget::status).collect(),
        }
    }

    /// Push the store to every target once, sequentially, in registration order
    pub async fn push_metrics(&self) {
        for target in &self.targets {
            debug!("Exporter: pushing to {} ({})", target.name(), target.address());
            match self.push_to(target).await {
                Ok(lines) => debug!("Exporter: pushed {} lines to {}", lines, target.name()),
                Err(e) => warn!("Exporter: push to {} failed: {}", target.name(), e),
            }
        }
    }

    /// Dial, set the deadline, write everything, close.
    async fn push_to(&self, target: &PushTarget) -> Result<u64, ExportError> {
        let mut conn = self
            .dialer
            .dial(target.network(), target.address(), self.write_deadline)
            .await
            .map_err(|source| ExportError::Dial {
                network: target.network().to_string(),
                address: target.address().to_string(),
                source,
            })?;

        if let Err(source) = conn.set_deadline(Instant::now() + self.write_deadline) {
            warn!(
                "Exporter: {} for {}, continuing without one",
                ExportError::Deadline { source },
                target.name()
            );
        }

        let result = self.write_socket_metrics(&mut *conn, target).await;

        if let Err(source) = conn.close().await {
            warn!(
                "Exporter: {} ({})",
                ExportError::Close { source },
                target.name()
            );
        }

        result
    }

    /// Write one line per label set. Stops at the first failed write; lines
    /// already written stay delivered.
    async fn write_socket_metrics(
        &self,
        conn: &mut dyn Connection,
        target: &PushTarget,
    ) -> Result<u64, ExportError> {
        let store = self.store.read().await;
        let mut lines_written = 0;

        for metric in store.metrics() {
            let series = metric.read().await;
            for label_set in series.label_sets() {
                target.counters().record_attempt();
                let line = target
                    .formatter()
                    .format_line(&self.hostname, metric, &label_set);
                let sent = conn
                    .write_line(&line)
                    .await
                    .map_err(|source| ExportError::Write {
                        lines_written,
                        source,
                    })?;
                trace!("Exporter: sent {} bytes to {}", sent, target.name());
                target.counters().record_success();
                lines_written += 1;
            }
        }

        Ok(lines_written)
    }

    /// Push on a fixed interval until the returned task is aborted.
    ///
    /// Returns `None` and starts nothing when no targets are registered. A tick
    /// that overruns the interval delays the next one rather than overlapping it.
    pub fn start_metric_push(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if self.targets.is_empty() {
            info!("Exporter: no push targets registered, metric push not started");
            return None;
        }

        info!(
            "Exporter: started metric push to {} targets (interval: {:?})",
            self.targets.len(),
            self.push_interval
        );
        Some(tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + self.push_interval, self.push_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.push_metrics().await;
            }
        }))
    }
}

fn resolve_hostname(configured: Option<String>) -> Result<String, ExportError> {
    let non_empty = |h: String| {
        let h = h.trim().to_string();
        (!h.is_empty()).then_some(h)
    };

    configured
        .and_then(non_empty)
        .or_else(|| std::env::var("HOSTNAME").ok().and_then(non_empty))
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .and_then(non_empty)
        })
        .ok_or_else(|| ExportError::Configuration {
            reason: "could not determine hostname, set one explicitly".to_string(),
        })
}

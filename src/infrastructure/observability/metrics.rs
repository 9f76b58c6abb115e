//! Prometheus counters for push exports
//!
//! All metrics use the `metric_push_` prefix and live in their own registry,
//! separate from the store being exported.

use prometheus::{IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Per-target export counters
#[derive(Clone)]
pub struct ExportMetrics {
    registry: Arc<Registry>,
    /// Label sets the exporter tried to write, by target
    pub export_total: IntCounterVec,
    /// Label sets written without error, by target
    pub export_success: IntCounterVec,
}

impl ExportMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let export_total = IntCounterVec::new(
            Opts::new(
                "metric_push_export_total",
                "Label sets attempted per push target",
            ),
            &["target"],
        )?;
        registry.register(Box::new(export_total.clone()))?;

        let export_success = IntCounterVec::new(
            Opts::new(
                "metric_push_export_success_total",
                "Label sets successfully written per push target",
            ),
            &["target"],
        )?;
        registry.register(Box::new(export_success.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            export_total,
            export_success,
        })
    }

    /// Counter handles for one target; calling twice with a name shares counters
    pub fn target_counters(&self, target: &str) -> TargetCounters {
        TargetCounters {
            total: self.export_total.with_label_values(&[target]),
            success: self.export_success.with_label_values(&[target]),
        }
    }

    /// Render all counters in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }
}

/// Attempt/success pair owned by one push target
#[derive(Clone)]
pub struct TargetCounters {
    total: IntCounter,
    success: IntCounter,
}

impl TargetCounters {
    pub fn record_attempt(&self) {
        self.total.inc();
    }

    pub fn record_success(&self) {
        self.success.inc();
    }

    pub fn attempted(&self) -> u64 {
        self.total.get()
    }

    pub fn succeeded(&self) -> u64 {
        self.success.get()
    }
}

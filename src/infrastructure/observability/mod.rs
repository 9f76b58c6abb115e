//! Exporter self-observability
//!
//! Counters are readable in-process (status snapshots) or rendered as
//! Prometheus text. Nothing here listens on a socket.

pub mod metrics;

pub use metrics::{ExportMetrics, TargetCounters};

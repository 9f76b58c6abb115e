// Push scheduling, per-target delivery and status reporting
pub mod exporter;

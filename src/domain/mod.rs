// Metric registry shared with producers
pub mod metrics;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::exporter::{Exporter, ExporterOptions};
pub use domain::metrics::{Kind, Metric, Store};

//! In-memory metric registry shared by producers and exporters.
//!
//! Lock order is always store, then metric. Exporters hold the store read
//! guard for a whole push and each metric's read guard only while draining
//! that metric's label sets.

pub mod datum;
pub mod labels;
pub mod metric;
pub mod store;

pub use datum::{Datum, DatumValue};
pub use labels::{LabelEscaping, format_labels};
pub use metric::{Kind, LabelSet, LabelSets, Metric, MetricReadGuard};
pub use store::{Store, StoreReadGuard};

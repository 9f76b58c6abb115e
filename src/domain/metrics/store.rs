use super::metric::Metric;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Registry of every metric known to the process, keyed by metric name.
///
/// One name may map to several metrics, e.g. the same name declared by two
/// programs. Producers add metrics; exporters only ever read.
#[derive(Debug, Default)]
pub struct Store {
    metrics: RwLock<BTreeMap<String, Vec<Arc<Metric>>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, metric: Arc<Metric>) {
        let mut metrics = self.metrics.write().await;
        metrics
            .entry(metric.name().to_string())
            .or_default()
            .push(metric);
    }

    /// Read-lock the whole registry for the lifetime of the returned guard
    pub async fn read(&self) -> StoreReadGuard<'_> {
        StoreReadGuard {
            metrics: self.metrics.read().await,
        }
    }
}

pub struct StoreReadGuard<'a> {
    metrics: RwLockReadGuard<'a, BTreeMap<String, Vec<Arc<Metric>>>>,
}

impl StoreReadGuard<'_> {
    /// Every registered metric, across all names
    pub fn metrics(&self) -> impl Iterator<Item = &Arc<Metric>> + '_ {
        self.metrics.values().flatten()
    }

    pub fn get(&self, name: &str) -> &[Arc<Metric>] {
        self.metrics.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.metrics.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

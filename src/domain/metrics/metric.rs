use super::datum::{Datum, DatumValue};
use crate::domain::errors::MetricError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::{RwLock, RwLockReadGuard};

/// What a metric measures; decides the type token some line formats emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Counter,
    Gauge,
    Timer,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Counter => "counter",
            Kind::Gauge => "gauge",
            Kind::Timer => "timer",
        }
    }
}

/// One labeled time series as seen by an exporter.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSet {
    pub labels: BTreeMap<String, String>,
    pub datum: Datum,
}

/// A named metric and all of its labeled series.
///
/// Identity (name, program, kind, keys) is fixed at construction. The series
/// map sits behind its own lock so producers can update one metric while an
/// exporter reads another.
#[derive(Debug)]
pub struct Metric {
    name: String,
    program: String,
    kind: Kind,
    keys: Vec<String>,
    series: RwLock<BTreeMap<Vec<String>, Datum>>,
}

impl Metric {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        kind: Kind,
        keys: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            kind,
            keys,
            series: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Read-lock the series map for the lifetime of the returned guard
    pub async fn read(&self) -> MetricReadGuard<'_> {
        MetricReadGuard {
            keys: &self.keys,
            series: self.series.read().await,
        }
    }

    pub async fn set(
        &self,
        label_values: &[&str],
        value: impl Into<DatumValue>,
    ) -> Result<(), MetricError> {
        self.set_at(label_values, value, Utc::now()).await
    }

    pub async fn set_at(
        &self,
        label_values: &[&str],
        value: impl Into<DatumValue>,
        at: DateTime<Utc>,
    ) -> Result<(), MetricError> {
        let key = self.series_key(label_values)?;
        let value = value.into();
        let mut series = self.series.write().await;
        series
            .entry(key)
            .and_modify(|datum| datum.set(value, at))
            .or_insert_with(|| Datum::new(value, at));
        Ok(())
    }

    pub async fn increment_by(
        &self,
        label_values: &[&str],
        delta: impl Into<DatumValue>,
    ) -> Result<(), MetricError> {
        self.increment_by_at(label_values, delta, Utc::now()).await
    }

    pub async fn increment_by_at(
        &self,
        label_values: &[&str],
        delta: impl Into<DatumValue>,
        at: DateTime<Utc>,
    ) -> Result<(), MetricError> {
        let key = self.series_key(label_values)?;
        let delta = delta.into();
        let mut series = self.series.write().await;
        series
            .entry(key)
            .and_modify(|datum| datum.increment_by(delta, at))
            .or_insert_with(|| Datum::new(delta, at));
        Ok(())
    }

    fn series_key(&self, label_values: &[&str]) -> Result<Vec<String>, MetricError> {
        if label_values.len() != self.keys.len() {
            return Err(MetricError::LabelArity {
                metric: self.name.clone(),
                expected: self.keys.len(),
                actual: label_values.len(),
            });
        }
        Ok(label_values.iter().map(|v| v.to_string()).collect())
    }
}

/// Read access to one metric's series, held while its label sets are exported.
pub struct MetricReadGuard<'a> {
    keys: &'a [String],
    series: RwLockReadGuard<'a, BTreeMap<Vec<String>, Datum>>,
}

impl MetricReadGuard<'_> {
    /// Every series of the metric, each exactly once.
    ///
    /// The iterator borrows the guard, so the metric stays locked until the
    /// caller has drained it and dropped the guard.
    pub fn label_sets(&self) -> LabelSets<'_> {
        LabelSets {
            keys: self.keys,
            series: self.series.iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Single-pass iterator over a locked metric's label sets
pub struct LabelSets<'a> {
    keys: &'a [String],
    series: std::collections::btree_map::Iter<'a, Vec<String>, Datum>,
}

impl Iterator for LabelSets<'_> {
    type Item = LabelSet;

    fn next(&mut self) -> Option<LabelSet> {
        let (values, datum) = self.series.next()?;
        let labels = self
            .keys
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect();
        Some(LabelSet {
            labels,
            datum: datum.clone(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.series.size_hint()
    }
}

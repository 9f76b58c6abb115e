use chrono::{DateTime, Utc};
use std::fmt;

/// Numeric value of one time series
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatumValue {
    Int(i64),
    Float(f64),
}

impl fmt::Display for DatumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatumValue::Int(v) => write!(f, "{v}"),
            DatumValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for DatumValue {
    fn from(value: i64) -> Self {
        DatumValue::Int(value)
    }
}

impl From<i32> for DatumValue {
    fn from(value: i32) -> Self {
        DatumValue::Int(value.into())
    }
}

impl From<f64> for DatumValue {
    fn from(value: f64) -> Self {
        DatumValue::Float(value)
    }
}

impl DatumValue {
    fn add(self, delta: DatumValue) -> DatumValue {
        match (self, delta) {
            (DatumValue::Int(a), DatumValue::Int(b)) => DatumValue::Int(a.saturating_add(b)),
            (a, b) => DatumValue::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            DatumValue::Int(v) => v as f64,
            DatumValue::Float(v) => v,
        }
    }
}

/// Current value of a time series and when it last changed
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    value: DatumValue,
    updated_at: DateTime<Utc>,
}

impl Datum {
    pub fn new(value: DatumValue, updated_at: DateTime<Utc>) -> Self {
        Self { value, updated_at }
    }

    pub fn value(&self) -> DatumValue {
        self.value
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Last update as whole seconds since the Unix epoch
    pub fn unix_time(&self) -> i64 {
        self.updated_at.timestamp()
    }

    pub(crate) fn set(&mut self, value: DatumValue, at: DateTime<Utc>) {
        self.value = value;
        self.updated_at = at;
    }

    pub(crate) fn increment_by(&mut self, delta: DatumValue, at: DateTime<Utc>) {
        self.value = self.value.add(delta);
        self.updated_at = at;
    }
}

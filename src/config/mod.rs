//! Configuration module for metric-push.
//!
//! Configuration comes from an optional TOML file, then environment variables
//! override individual fields. Command-line flags are applied last by the
//! binary.

mod target_config;

pub use target_config::TargetConfig;

use crate::infrastructure::formats::LineFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PUSH_INTERVAL_SECONDS: u64 = 60;
pub const DEFAULT_WRITE_DEADLINE_MS: u64 = 10_000;
/// One day
pub const MAX_PUSH_INTERVAL_SECONDS: u64 = 86_400;
/// One hour
pub const MAX_WRITE_DEADLINE_MS: u64 = 3_600_000;

/// Main exporter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between push ticks
    pub push_interval_seconds: u64,
    /// Dial timeout and per-connection write deadline
    pub write_deadline_ms: u64,
    /// Hostname embedded in collectd lines; resolved from the OS when unset
    pub hostname: Option<String>,
    /// Seconds between export status reports; 0 disables reporting
    pub status_interval_seconds: u64,
    pub targets: Vec<TargetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            push_interval_seconds: DEFAULT_PUSH_INTERVAL_SECONDS,
            write_deadline_ms: DEFAULT_WRITE_DEADLINE_MS,
            hostname: None,
            status_interval_seconds: 0,
            targets: Vec::new(),
        }
    }
}

/// Environment variables naming a single backend address, with its prefix variable
const BACKEND_ENV: [(LineFormat, &str, &str); 3] = [
    (LineFormat::Collectd, "COLLECTD_SOCKETPATH", "COLLECTD_PREFIX"),
    (LineFormat::Graphite, "GRAPHITE_HOSTPORT", "GRAPHITE_PREFIX"),
    (LineFormat::Statsd, "STATSD_HOSTPORT", "STATSD_PREFIX"),
];

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup; `apply_env` passes the process environment.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("PUSH_INTERVAL_SECONDS") {
            self.push_interval_seconds = value
                .parse()
                .with_context(|| format!("Invalid PUSH_INTERVAL_SECONDS: {}", value))?;
        }
        if let Some(value) = lookup("PUSH_WRITE_DEADLINE_MS") {
            self.write_deadline_ms = value
                .parse()
                .with_context(|| format!("Invalid PUSH_WRITE_DEADLINE_MS: {}", value))?;
        }
        if let Some(value) = lookup("STATUS_INTERVAL_SECONDS") {
            self.status_interval_seconds = value
                .parse()
                .with_context(|| format!("Invalid STATUS_INTERVAL_SECONDS: {}", value))?;
        }
        if let Some(value) = lookup("PUSH_HOSTNAME").filter(|v| !v.is_empty()) {
            self.hostname = Some(value);
        }

        for (format, address_key, prefix_key) in BACKEND_ENV {
            let Some(address) = lookup(address_key).filter(|a| !a.trim().is_empty()) else {
                continue;
            };
            let prefix = lookup(prefix_key).unwrap_or_default();
            self.targets
                .push(TargetConfig::new(format, address).with_prefix(prefix));
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PUSH_INTERVAL_SECONDS).contains(&self.push_interval_seconds) {
            anyhow::bail!(
                "push_interval_seconds must be between 1 and {}, got {}",
                MAX_PUSH_INTERVAL_SECONDS,
                self.push_interval_seconds
            );
        }
        if !(1..=MAX_WRITE_DEADLINE_MS).contains(&self.write_deadline_ms) {
            anyhow::bail!(
                "write_deadline_ms must be between 1 and {}, got {}",
                MAX_WRITE_DEADLINE_MS,
                self.write_deadline_ms
            );
        }
        for target in self.enabled_targets() {
            target.validate()?;
        }
        Ok(())
    }

    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(self.push_interval_seconds)
    }

    pub fn write_deadline(&self) -> Duration {
        Duration::from_millis(self.write_deadline_ms)
    }

    pub fn status_interval(&self) -> Option<Duration> {
        (self.status_interval_seconds > 0).then(|| Duration::from_secs(self.status_interval_seconds))
    }

    /// Targets with an address, in declaration order
    pub fn enabled_targets(&self) -> impl Iterator<Item = &TargetConfig> {
        self.targets.iter().filter(|target| target.is_enabled())
    }
}

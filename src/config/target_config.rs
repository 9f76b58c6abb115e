//! Push target configuration.
//!
//! A target is enabled only when it carries a non-empty address; everything
//! else has a sensible default derived from its format.

use crate::domain::ports::NetworkKind;
use crate::infrastructure::formats::{FormatSettings, LineFormat, collectd};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Counter label and log name; defaults to the format name
    #[serde(default)]
    pub name: Option<String>,
    pub format: LineFormat,
    /// Defaults to the format's conventional transport
    #[serde(default)]
    pub network: Option<NetworkKind>,
    /// host:port, or a socket path for unix targets
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub prefix: String,
    /// collectd plugin name
    #[serde(default)]
    pub plugin: Option<String>,
}

impl TargetConfig {
    pub fn new(format: LineFormat, address: impl Into<String>) -> Self {
        Self {
            name: None,
            format,
            network: None,
            address: Some(address.into()),
            prefix: String::new(),
            plugin: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.address
            .as_deref()
            .is_some_and(|address| !address.trim().is_empty())
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.format.as_str())
    }

    pub fn network(&self) -> NetworkKind {
        self.network.unwrap_or(self.format.default_network())
    }

    pub fn address(&self) -> &str {
        self.address.as_deref().map(str::trim).unwrap_or_default()
    }

    /// statsd lines carry no terminator, so each one must travel as its own
    /// datagram
    pub fn validate(&self) -> Result<()> {
        if self.format == LineFormat::Statsd && self.network() != NetworkKind::Udp {
            anyhow::bail!(
                "target {}: statsd needs network \"udp\", got \"{}\"",
                self.name(),
                self.network()
            );
        }
        Ok(())
    }

    pub fn format_settings(&self, push_interval: Duration) -> FormatSettings {
        FormatSettings {
            prefix: self.prefix.clone(),
            plugin: self
                .plugin
                .clone()
                .unwrap_or_else(|| collectd::DEFAULT_PLUGIN.to_string()),
            push_interval,
        }
    }
}

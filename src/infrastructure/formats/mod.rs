use crate::domain::metrics::{LabelEscaping, LabelSet, Metric};
use crate::domain::ports::NetworkKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub mod collectd;
pub mod graphite;
pub mod statsd;

/// Renders one label set of a metric as a line for a specific backend
pub trait LineFormatter: Send + Sync {
    fn format_line(&self, hostname: &str, metric: &Metric, label_set: &LabelSet) -> String;
}

/// Wire formats a push target can speak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineFormat {
    Collectd,
    Graphite,
    Statsd,
}

impl LineFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineFormat::Collectd => "collectd",
            LineFormat::Graphite => "graphite",
            LineFormat::Statsd => "statsd",
        }
    }

    /// Transport the backend conventionally listens on
    pub fn default_network(&self) -> NetworkKind {
        match self {
            LineFormat::Collectd => NetworkKind::Unix,
            LineFormat::Graphite => NetworkKind::Tcp,
            LineFormat::Statsd => NetworkKind::Udp,
        }
    }

    pub fn escaping(&self) -> LabelEscaping {
        match self {
            LineFormat::Collectd => LabelEscaping::DASHED,
            LineFormat::Graphite | LineFormat::Statsd => LabelEscaping::DOTTED,
        }
    }
}

impl fmt::Display for LineFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "collectd" => Ok(LineFormat::Collectd),
            "graphite" => Ok(LineFormat::Graphite),
            "statsd" => Ok(LineFormat::Statsd),
            _ => anyhow::bail!(
                "Invalid format: {}. Must be 'collectd', 'graphite', or 'statsd'",
                s
            ),
        }
    }
}

/// Per-target knobs shared by the formatters
#[derive(Debug, Clone)]
pub struct FormatSettings {
    /// Prepended to every metric path
    pub prefix: String,
    /// collectd plugin name
    pub plugin: String,
    /// Reported to collectd as the series interval
    pub push_interval: Duration,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            plugin: collectd::DEFAULT_PLUGIN.to_string(),
            push_interval: Duration::from_secs(60),
        }
    }
}

/// Factory function to create a formatter for a wire format
pub fn create_formatter(format: LineFormat, settings: &FormatSettings) -> Box<dyn LineFormatter> {
    let escaping = format.escaping();
    match format {
        LineFormat::Collectd => Box::new(collectd::CollectdFormatter::new(
            &settings.prefix,
            &settings.plugin,
            settings.push_interval,
            escaping,
        )),
        LineFormat::Graphite => Box::new(graphite::GraphiteFormatter::new(&settings.prefix, escaping)),
        LineFormat::Statsd => Box::new(statsd::StatsdFormatter::new(&settings.prefix, escaping)),
    }
}

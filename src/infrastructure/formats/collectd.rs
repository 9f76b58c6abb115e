use super::LineFormatter;
use crate::domain::metrics::{Kind, LabelEscaping, LabelSet, Metric};
use std::time::Duration;

pub const DEFAULT_PLUGIN: &str = "metric_push";

/// collectd unixsock `PUTVAL` command encoder
///
/// `PUTVAL "<host>/<prefix><plugin>-<program>/<type>-<name and labels>" interval=<secs> <time>:<value>`
pub struct CollectdFormatter {
    prefix: String,
    plugin: String,
    interval_secs: u64,
    escaping: LabelEscaping,
}

impl CollectdFormatter {
    pub fn new(prefix: &str, plugin: &str, interval: Duration, escaping: LabelEscaping) -> Self {
        Self {
            prefix: prefix.to_string(),
            plugin: plugin.to_string(),
            interval_secs: interval.as_secs(),
            escaping,
        }
    }
}

/// collectd has no timer type
fn collectd_type(kind: Kind) -> &'static str {
    match kind {
        Kind::Timer => Kind::Gauge.as_str(),
        other => other.as_str(),
    }
}

impl LineFormatter for CollectdFormatter {
    fn format_line(&self, hostname: &str, metric: &Metric, label_set: &LabelSet) -> String {
        format!(
            "PUTVAL \"{}/{}{}-{}/{}-{}\" interval={} {}:{}\n",
            hostname,
            self.prefix,
            self.plugin,
            metric.program(),
            collectd_type(metric.kind()),
            self.escaping.format(metric.name(), &label_set.labels),
            self.interval_secs,
            label_set.datum.unix_time(),
            label_set.datum.value(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::formats::test_support::*;
    use crate::domain::metrics::DatumValue;

    fn formatter(prefix: &str) -> CollectdFormatter {
        CollectdFormatter::new(
            prefix,
            DEFAULT_PLUGIN,
            Duration::from_secs(60),
            LabelEscaping::DASHED,
        )
    }

    #[test]
    fn test_counter_line() {
        let line = formatter("").format_line(
            "gunstar",
            &metric(Kind::Counter),
            &label_set(&[("region", "us")], DatumValue::Int(37)),
        );
        assert_eq!(
            line,
            "PUTVAL \"gunstar/metric_push-web/counter-requests-region-us\" interval=60 1700000000:37\n"
        );
    }

    #[test]
    fn test_timer_exports_as_gauge() {
        let line = formatter("").format_line(
            "gunstar",
            &metric(Kind::Timer),
            &label_set(&[("region", "eu")], DatumValue::Float(0.25)),
        );
        assert!(line.contains("/gauge-requests-region-eu\""));
        assert!(line.ends_with(" 1700000000:0.25\n"));
    }

    #[test]
    fn test_prefix_and_dash_escaping() {
        let line = formatter("prefix").format_line(
            "gunstar",
            &metric(Kind::Gauge),
            &label_set(&[("region", "us-east-1")], DatumValue::Int(1)),
        );
        assert_eq!(
            line,
            "PUTVAL \"gunstar/prefixmetric_push-web/gauge-requests-region-us_east_1\" interval=60 1700000000:1\n"
        );
    }
}

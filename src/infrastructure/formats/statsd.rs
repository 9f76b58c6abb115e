use super::LineFormatter;
use crate::domain::metrics::{Kind, LabelEscaping, LabelSet, Metric};

/// statsd datagram: `<prefix><program>.<path>:<value>|<type>`
pub struct StatsdFormatter {
    prefix: String,
    escaping: LabelEscaping,
}

impl StatsdFormatter {
    pub fn new(prefix: &str, escaping: LabelEscaping) -> Self {
        Self {
            prefix: prefix.to_string(),
            escaping,
        }
    }
}

fn statsd_type(kind: Kind) -> &'static str {
    match kind {
        Kind::Counter => "c",
        Kind::Gauge => "g",
        Kind::Timer => "ms",
    }
}

impl LineFormatter for StatsdFormatter {
    fn format_line(&self, _hostname: &str, metric: &Metric, label_set: &LabelSet) -> String {
        format!(
            "{}{}.{}:{}|{}",
            self.prefix,
            metric.program(),
            self.escaping.format(metric.name(), &label_set.labels),
            label_set.datum.value(),
            statsd_type(metric.kind()),
        )
    }
}

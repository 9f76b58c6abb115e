use super::LineFormatter;
use crate::domain::metrics::{LabelEscaping, LabelSet, Metric};

/// Graphite plaintext protocol: `<prefix><program>.<path> <value> <time>\n`
pub struct GraphiteFormatter {
    prefix: String,
    escaping: LabelEscaping,
}

impl GraphiteFormatter {
    pub fn new(prefix: &str, escaping: LabelEscaping) -> Self {
        Self {
            prefix: prefix.to_string(),
            escaping,
        }
    }
}

impl LineFormatter for GraphiteFormatter {
    fn format_line(&self, _hostname: &str, metric: &Metric, label_set: &LabelSet) -> String {
        format!(
            "{}{}.{} {} {}\n",
            self.prefix,
            metric.program(),
            self.escaping.format(metric.name(), &label_set.labels),
            label_set.datum.value(),
            label_set.datum.unix_time(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{DatumValue, Kind};
    use crate::infrastructure::formats::test_support::*;

    #[test]
    fn test_plaintext_line() {
        let line = GraphiteFormatter::new("", LabelEscaping::DOTTED).format_line(
            "gunstar",
            &metric(Kind::Counter),
            &label_set(&[("region", "us")], DatumValue::Int(37)),
        );
        assert_eq!(line, "web.requests.region.us 37 1700000000\n");
    }

    #[test]
    fn test_dots_in_labels_do_not_add_path_segments() {
        let line = GraphiteFormatter::new("carbon.", LabelEscaping::DOTTED).format_line(
            "gunstar",
            &metric(Kind::Gauge),
            &label_set(&[("region", "eu.west")], DatumValue::Float(1.5)),
        );
        assert_eq!(line, "carbon.web.requests.region.eu_west 1.5 1700000000\n");
    }

    #[test]
    fn test_unlabeled_series_uses_bare_name() {
        let line = GraphiteFormatter::new("", LabelEscaping::DOTTED).format_line(
            "gunstar",
            &metric(Kind::Gauge),
            &label_set(&[], DatumValue::Int(0)),
        );
        assert_eq!(line, "web.requests 0 1700000000\n");
    }
}

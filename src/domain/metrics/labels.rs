//! Label serialization shared by every line format.
//!
//! A metric name and its labels are flattened into one token such as
//! `latency.path./a_b`. Separator characters found inside a key or value are
//! replaced so the downstream parser never sees a spurious field boundary.

use std::collections::BTreeMap;

/// Separator triple a line format uses when flattening labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelEscaping {
    /// Placed between a key and its value
    pub key_separator: &'static str,
    /// Placed between the name and the first pair, and between pairs
    pub pair_separator: &'static str,
    /// Substituted for either separator inside a key or value
    pub replacement: &'static str,
}

impl LabelEscaping {
    /// collectd type instances use dashes
    pub const DASHED: Self = Self {
        key_separator: "-",
        pair_separator: "-",
        replacement: "_",
    };

    /// graphite and statsd paths use dots
    pub const DOTTED: Self = Self {
        key_separator: ".",
        pair_separator: ".",
        replacement: "_",
    };

    pub fn format(&self, name: &str, labels: &BTreeMap<String, String>) -> String {
        format_labels(
            name,
            labels,
            self.key_separator,
            self.pair_separator,
            self.replacement,
        )
    }
}

/// Render `name` followed by every `key<key_sep>value` pair, all joined with `pair_sep`.
///
/// Pairs come out in ascending key order, so identical input always renders
/// the same line.
pub fn format_labels(
    name: &str,
    labels: &BTreeMap<String, String>,
    key_sep: &str,
    pair_sep: &str,
    replacement: &str,
) -> String {
    if labels.is_empty() {
        return name.to_string();
    }

    let mut line = String::from(name);
    for (key, value) in labels {
        line.push_str(pair_sep);
        line.push_str(&escape(key, key_sep, pair_sep, replacement));
        line.push_str(key_sep);
        line.push_str(&escape(value, key_sep, pair_sep, replacement));
    }
    line
}

fn escape(text: &str, key_sep: &str, pair_sep: &str, replacement: &str) -> String {
    let mut escaped = text.to_string();
    // str::replace with an empty pattern would interleave the replacement
    for sep in [key_sep, pair_sep] {
        if !sep.is_empty() && escaped.contains(sep) {
            escaped = escaped.replace(sep, replacement);
        }
    }
    escaped
}

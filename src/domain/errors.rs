use std::io;
use thiserror::Error;

/// Errors raised while building the exporter or pushing to a target.
///
/// Only `Configuration` is fatal. Everything else is scoped to one target for
/// one tick and is logged and swallowed by the push loop.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Exporter misconfigured: {reason}")]
    Configuration { reason: String },

    #[error("Dial {network} {address} failed: {source}")]
    Dial {
        network: String,
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Could not set connection deadline: {source}")]
    Deadline {
        #[source]
        source: io::Error,
    },

    #[error("Write failed after {lines_written} lines: {source}")]
    Write {
        lines_written: u64,
        #[source]
        source: io::Error,
    },

    #[error("Connection close failed: {source}")]
    Close {
        #[source]
        source: io::Error,
    },
}

/// Errors raised by producers mutating the metric store
#[derive(Debug, Error, PartialEq)]
pub enum MetricError {
    #[error("Metric {metric} expects {expected} label values, got {actual}")]
    LabelArity {
        metric: String,
        expected: usize,
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_error_formatting() {
        let error = ExportError::Dial {
            network: "tcp".to_string(),
            address: "localhost:2003".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };

        let msg = error.to_string();
        assert!(msg.contains("tcp"));
        assert!(msg.contains("localhost:2003"));
        assert!(msg.contains("refused"));
    }

    #[test]
    fn test_write_error_keeps_source() {
        let error = ExportError::Write {
            lines_written: 3,
            source: io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"),
        };

        assert!(error.to_string().contains("after 3 lines"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_label_arity_formatting() {
        let error = MetricError::LabelArity {
            metric: "requests".to_string(),
            expected: 2,
            actual: 1,
        };

        assert_eq!(
            error.to_string(),
            "Metric requests expects 2 label values, got 1"
        );
    }
}

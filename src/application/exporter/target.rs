use super::status::TargetStatus;
use crate::domain::ports::NetworkKind;
use crate::infrastructure::formats::LineFormatter;
use crate::infrastructure::observability::TargetCounters;

/// One downstream backend the exporter dials every tick.
///
/// Fixed after registration; only the counters move.
pub struct PushTarget {
    name: String,
    network: NetworkKind,
    address: String,
    formatter: Box<dyn LineFormatter>,
    counters: TargetCounters,
}

impl PushTarget {
    pub fn new(
        name: impl Into<String>,
        network: NetworkKind,
        address: impl Into<String>,
        formatter: Box<dyn LineFormatter>,
        counters: TargetCounters,
    ) -> Self {
        Self {
            name: name.into(),
            network,
            address: address.into(),
            formatter,
            counters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network(&self) -> NetworkKind {
        self.network
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn formatter(&self) -> &dyn LineFormatter {
        self.formatter.as_ref()
    }

    pub fn counters(&self) -> &TargetCounters {
        &self.counters
    }

    pub fn status(&self) -> TargetStatus {
        TargetStatus {
            name: self.name.clone(),
            network: self.network,
            address: self.address.clone(),
            export_total: self.counters.attempted(),
            export_success: self.counters.succeeded(),
        }
    }
}

impl std::fmt::Debug for PushTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushTarget")
            .field("name", &self.name)
            .field("network", &self.network)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

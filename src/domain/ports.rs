use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;

/// Transport used to reach a push target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    Tcp,
    Udp,
    Unix,
}

impl NetworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKind::Tcp => "tcp",
            NetworkKind::Udp => "udp",
            NetworkKind::Unix => "unix",
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(NetworkKind::Tcp),
            "udp" => Ok(NetworkKind::Udp),
            "unix" => Ok(NetworkKind::Unix),
            _ => anyhow::bail!("Invalid network: {}. Must be 'tcp', 'udp', or 'unix'", s),
        }
    }
}

/// An open, short-lived connection to one push target.
#[async_trait]
pub trait Connection: Send {
    /// Bound every later write by an absolute deadline
    fn set_deadline(&mut self, deadline: Instant) -> io::Result<()>;

    /// Write one rendered line in full, returning the bytes written
    async fn write_line(&mut self, line: &str) -> io::Result<usize>;

    async fn close(&mut self) -> io::Result<()>;
}

/// Opens connections to push targets.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(
        &self,
        network: NetworkKind,
        address: &str,
        timeout: Duration,
    ) -> io::Result<Box<dyn Connection>>;
}

//! Socket-backed `Dialer` for tcp, udp and unix stream targets.

use crate::domain::ports::{Connection, Dialer, NetworkKind};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::Instant;
use tracing::debug;

#[cfg(unix)]
use tokio::net::UnixStream;

/// Dials real sockets with tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketDialer;

impl SocketDialer {
    pub fn new() -> Self {
        Self
    }

    async fn connect(network: NetworkKind, address: &str) -> io::Result<Stream> {
        match network {
            NetworkKind::Tcp => Ok(Stream::Tcp(TcpStream::connect(address).await?)),
            NetworkKind::Udp => {
                let remote = tokio::net::lookup_host(address).await?.next().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, format!("no address for {address}"))
                })?;
                let local: SocketAddr = if remote.is_ipv4() {
                    ([0u8; 4], 0).into()
                } else {
                    ([0u16; 8], 0).into()
                };
                let socket = UdpSocket::bind(local).await?;
                socket.connect(remote).await?;
                Ok(Stream::Udp(socket))
            }
            #[cfg(unix)]
            NetworkKind::Unix => Ok(Stream::Unix(UnixStream::connect(address).await?)),
            #[cfg(not(unix))]
            NetworkKind::Unix => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "unix sockets are not available on this platform",
            )),
        }
    }
}

#[async_trait]
impl Dialer for SocketDialer {
    async fn dial(
        &self,
        network: NetworkKind,
        address: &str,
        timeout: Duration,
    ) -> io::Result<Box<dyn Connection>> {
        let stream = match tokio::time::timeout(timeout, Self::connect(network, address)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("dial timed out after {timeout:?}"),
                ));
            }
        };

        debug!("SocketDialer: connected to {} {}", network, address);
        Ok(Box::new(SocketConnection {
            stream,
            deadline: None,
        }))
    }
}

enum Stream {
    Tcp(TcpStream),
    Udp(UdpSocket),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Stream {
    async fn write_line(&mut self, bytes: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(stream) => stream.write_all(bytes).await.map(|_| bytes.len()),
            Stream::Udp(socket) => {
                let sent = socket.send(bytes).await?;
                if sent != bytes.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("datagram truncated: sent {sent} of {} bytes", bytes.len()),
                    ));
                }
                Ok(sent)
            }
            #[cfg(unix)]
            Stream::Unix(stream) => stream.write_all(bytes).await.map(|_| bytes.len()),
        }
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(stream) => stream.shutdown().await,
            // Datagram sockets have nothing to flush
            Stream::Udp(_) => Ok(()),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.shutdown().await,
        }
    }
}

/// A dialed socket plus the absolute deadline its writes must meet
pub struct SocketConnection {
    stream: Stream,
    deadline: Option<Instant>,
}

#[async_trait]
impl Connection for SocketConnection {
    fn set_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        if deadline <= Instant::now() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "deadline is already in the past",
            ));
        }
        self.deadline = Some(deadline);
        Ok(())
    }

    async fn write_line(&mut self, line: &str) -> io::Result<usize> {
        let bytes = line.as_bytes();
        match self.deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, self.stream.write_line(bytes)).await {
                    Ok(result) => result,
                    Err(_) => Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "write deadline exceeded",
                    )),
                }
            }
            None => self.stream.write_line(bytes).await,
        }
    }

    async fn close(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}

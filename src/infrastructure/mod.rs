pub mod formats;
pub mod network;
pub mod observability;

pub use network::SocketDialer;

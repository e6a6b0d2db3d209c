//! Per-connection addressing.
//!
//! Handlers need both ends of the socket: the remote address for logging and
//! the local address the request arrived on, which the body rewrite treats
//! as the caller-facing origin.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use tokio::net::TcpListener;

/// Addresses of an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub local: SocketAddr,
    pub remote: SocketAddr,
}

impl ConnectionInfo {
    /// Local host rendered without brackets (IPv6) and without port.
    pub fn local_name(&self) -> String {
        self.local.ip().to_string()
    }

    pub fn local_port(&self) -> u16 {
        self.local.port()
    }
}

impl Connected<IncomingStream<'_, TcpListener>> for ConnectionInfo {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        let remote = *stream.remote_addr();
        let local = stream.io().local_addr().unwrap_or_else(|err| {
            tracing::warn!(error = %err, remote = %remote, "Local address unavailable");
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        });
        Self { local, remote }
    }
}

use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::UmbStream;

/// TCP service port instruments listen on.
pub const DEFAULT_PORT: u16 = 3001;

/// TCP transport to a networked instrument.
pub struct TcpTransport;

impl TcpTransport {
    /// Connect to an instrument (blocking).
    ///
    /// With `timeout` set, the connect attempt itself is bounded; read and
    /// write timeouts are configured separately on the returned stream.
    pub fn connect(addr: SocketAddr, timeout: Option<Duration>) -> Result<UmbStream> {
        let stream = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        }
        .map_err(|source| TransportError::Connect { addr, source })?;

        if let Err(err) = stream.set_nodelay(true) {
            debug!(%addr, %err, "could not disable nagle");
        }

        info!(%addr, "connected to instrument");
        Ok(UmbStream::from_tcp(stream))
    }

    /// Transport name for diagnostics.
    pub fn transport_name() -> &'static str {
        "tcp"
    }
}

/// Resolve a user-supplied address into a socket address.
///
/// Accepts a bare IP (`192.168.0.10`, `::1`), which gets `default_port`, or
/// anything `ToSocketAddrs` understands (`10.0.0.5:3001`, `station.local:3001`).
pub fn resolve_address(input: &str, default_port: u16) -> Result<SocketAddr> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TransportError::InvalidAddress {
            input: input.to_string(),
            reason: "address must not be empty".to_string(),
        });
    }

    if let Ok(ip) = trimmed.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }

    let mut addrs = trimmed
        .to_socket_addrs()
        .map_err(|err| TransportError::InvalidAddress {
            input: input.to_string(),
            reason: err.to_string(),
        })?;

    addrs.next().ok_or_else(|| TransportError::InvalidAddress {
        input: input.to_string(),
        reason: "address resolved to nothing".to_string(),
    })
}

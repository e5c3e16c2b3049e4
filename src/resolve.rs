//! Address resolution with an IPv6-first, IPv4-fallback policy.

use std::net::SocketAddr;

use tokio::net::{TcpStream, lookup_host};

use crate::error::{Error, Result};

/// Resolve `host:port`, preferring IPv6 addresses.
///
/// The IPv4 addresses are used only when the lookup yields no IPv6 address.
///
/// # Errors
///
/// Returns [`Error::Resolution`] if neither family produced an address.
pub async fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = match lookup_host((host, port)).await {
        Ok(found) => found.collect(),
        Err(e) => {
            tracing::debug!(host, port, "lookup failed: {e}");
            Vec::new()
        }
    };

    prefer_ipv6(addrs).ok_or_else(|| Error::Resolution {
        host: host.to_string(),
        port,
    })
}

/// Keep the IPv6 addresses if there are any, otherwise the IPv4 ones.
#[must_use]
pub fn prefer_ipv6(addrs: Vec<SocketAddr>) -> Option<Vec<SocketAddr>> {
    let (v6, v4): (Vec<_>, Vec<_>) = addrs.into_iter().partition(SocketAddr::is_ipv6);
    if !v6.is_empty() {
        Some(v6)
    } else if !v4.is_empty() {
        Some(v4)
    } else {
        None
    }
}

/// Resolve and connect, trying each address of the chosen family in order.
///
/// The returned stream has Nagle's algorithm disabled so handshake packets
/// are not coalesced.
///
/// # Errors
///
/// Returns [`Error::Resolution`] or [`Error::Connect`].
pub async fn open_transport(host: &str, port: u16) -> Result<TcpStream> {
    let mut last_error = None;
    for addr in resolve(host, port).await? {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                stream
                    .set_nodelay(true)
                    .map_err(|e| Error::Connect(format!("{addr}: {e}")))?;
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%addr, "connect failed: {e}");
                last_error = Some(format!("{addr}: {e}"));
            }
        }
    }
    Err(Error::Connect(
        last_error.unwrap_or_else(|| format!("{host}:{port}: no address")),
    ))
}

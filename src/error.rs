//! Error types for the stress client.
//!
//! Per-session failures (`Transport`, `Codec`, `ProtocolAnomaly`) are handled
//! inside the session and scheduler; only `NameTooLong`, `Resolution`,
//! `Connect` and `ReactorFault` ever reach the binary.

use thiserror::Error;

/// Result type alias for stress client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving sessions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Neither IPv6 nor IPv4 resolution produced an address.
    #[error("Could not resolve {host}:{port}")]
    Resolution {
        /// Host name that was looked up.
        host: String,
        /// Port that was looked up.
        port: u16,
    },

    /// The transport could not be established.
    #[error("Connect failed: {0}")]
    Connect(String),

    /// Read or write fault on an established session.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Inbound bytes could not be decoded into packets.
    #[error("Codec error: {0}")]
    Codec(String),

    /// The shared reactor could not be built or a worker callback faulted.
    #[error("Reactor fault: {0}")]
    ReactorFault(String),

    /// The peer sent something unexpected but survivable.
    #[error("Protocol anomaly: {0}")]
    ProtocolAnomaly(String),

    /// The client name does not fit in one identify packet.
    #[error("Client name too long: {len} bytes (max: {max})")]
    NameTooLong {
        /// Name length in bytes.
        len: usize,
        /// Largest name that fits.
        max: usize,
    },
}

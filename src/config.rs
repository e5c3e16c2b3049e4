//! Configuration for a stress run.

use std::time::Duration;

use crate::codec::MAX_PAYLOAD;
use crate::error::{Error, Result};

/// Default gateway port.
pub const DEFAULT_PORT: u16 = 15779;

/// Default number of simulated clients.
pub const DEFAULT_CONNECTIONS: u16 = 50;

/// Timing parameters for the scheduler, keepalive and launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    /// Scheduler cadence.
    ///
    /// Default: 10 ms
    pub tick: Duration,

    /// Keepalive period once a session is established.
    ///
    /// Default: 1 second
    pub keepalive: Duration,

    /// Delay between consecutive connection attempts.
    ///
    /// Default: 1 ms
    pub stagger: Duration,

    /// Interval between stats lines logged by the scheduler.
    ///
    /// Default: 5 seconds
    pub report: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(10),
            keepalive: Duration::from_secs(1),
            stagger: Duration::from_millis(1),
            report: Duration::from_secs(5),
        }
    }
}

impl Timings {
    /// Create timings with custom values.
    #[must_use]
    pub const fn new(tick: Duration, keepalive: Duration, stagger: Duration, report: Duration) -> Self {
        Self {
            tick,
            keepalive,
            stagger,
            report,
        }
    }
}

/// Fields the client announces in its identify packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Content locale byte.
    pub locale: u8,
    /// Module name.
    pub name: String,
    /// Client build version.
    pub version: u32,
}

impl ClientIdentity {
    /// Longest name that still fits the identify payload
    /// (`u8 locale | u16 length | name | u32 version`).
    pub const MAX_NAME_LEN: usize = MAX_PAYLOAD - 7;

    /// Check that the identify packet for this identity can be encoded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameTooLong`] if `name` exceeds [`Self::MAX_NAME_LEN`].
    pub fn check_name(&self) -> Result<()> {
        let len = self.name.len();
        if len > Self::MAX_NAME_LEN {
            Err(Error::NameTooLong {
                len,
                max: Self::MAX_NAME_LEN,
            })
        } else {
            Ok(())
        }
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            locale: 22,
            name: "SR_Client".to_string(),
            version: 123,
        }
    }
}

/// Stress run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Target host name or address.
    pub server: String,

    /// Target port.
    ///
    /// Default: 15779
    pub port: u16,

    /// Number of sessions to launch.
    ///
    /// Default: 50
    pub connections: u16,

    /// Number of runtime worker threads.
    ///
    /// Default: available parallelism minus one, at least 1
    pub workers: usize,

    /// Size of each session's receive buffer (in bytes).
    ///
    /// Default: 4096
    pub read_buffer_size: usize,

    /// Timing configuration.
    pub timings: Timings,

    /// Identity announced during the handshake.
    pub identity: ClientIdentity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: DEFAULT_PORT,
            connections: DEFAULT_CONNECTIONS,
            workers: crate::executor::default_workers(),
            read_buffer_size: 4096,
            timings: Timings::default(),
            identity: ClientIdentity::default(),
        }
    }
}

impl Config {
    /// Create a configuration targeting `server:port` with default settings.
    #[must_use]
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the number of sessions to launch.
    #[must_use]
    pub const fn with_connections(mut self, connections: u16) -> Self {
        self.connections = connections;
        self
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the receive buffer size.
    #[must_use]
    pub const fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set timing configuration.
    #[must_use]
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Set the announced client identity.
    #[must_use]
    pub fn with_identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Check the configuration before any session is opened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameTooLong`] if the identity cannot be encoded.
    pub fn validate(&self) -> Result<()> {
        self.identity.check_name()
    }
}

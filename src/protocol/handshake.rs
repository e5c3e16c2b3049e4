//! Client side of the gateway handshake.
//!
//! The sequence is fixed:
//!
//! ```text
//! Connecting -> AwaitingServerGreeting -> AwaitingVersionAck -> Established
//! ```
//!
//! `Established` loops on the keepalive timer. `Closed` is reachable from every
//! state and is terminal. Packets that do not match the current state are
//! ignored rather than treated as errors.

use crate::config::ClientIdentity;
use crate::error::Error;
use crate::protocol::{Opcode, Packet};

/// Version-ack flag meaning the client build is accepted.
pub const VERSION_OK: u8 = 1;

/// Session protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum SessionState {
    /// Transport not yet established.
    #[default]
    Connecting,
    /// Transport open, waiting for the server greeting.
    AwaitingServerGreeting,
    /// Identify sent, waiting for the version acknowledgement.
    AwaitingVersionAck,
    /// Handshake complete, keepalive running.
    Established,
    /// Transport released. Never processed again.
    Closed,
}

impl SessionState {
    /// Returns `true` for every state except `Closed`.
    #[must_use]
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, SessionState::Closed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::AwaitingServerGreeting => write!(f, "AwaitingServerGreeting"),
            SessionState::AwaitingVersionAck => write!(f, "AwaitingVersionAck"),
            SessionState::Established => write!(f, "Established"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

/// What the session has to do after a packet was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do.
    Ignored,
    /// Queue `reply` for sending.
    Reply(Packet),
    /// Queue `reply`, then arm the keepalive timer.
    ///
    /// `anomaly` carries a version mismatch notice, if any.
    Established {
        reply: Packet,
        anomaly: Option<Error>,
    },
}

/// Handshake state machine for one session.
#[derive(Debug, Clone)]
pub struct Handshake {
    state: SessionState,
    identity: ClientIdentity,
}

impl Handshake {
    #[must_use]
    pub fn new(identity: ClientIdentity) -> Self {
        Self {
            state: SessionState::Connecting,
            identity,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Record that the transport is up.
    pub fn transport_opened(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::AwaitingServerGreeting;
        }
    }

    /// Move to the terminal state.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Feed one decoded packet through the state machine.
    pub fn dispatch(&mut self, packet: &Packet) -> Outcome {
        match (packet.opcode, self.state) {
            (Opcode::Greeting, SessionState::AwaitingServerGreeting) => self.on_greeting(),
            (Opcode::VersionAck, SessionState::AwaitingVersionAck) => self.on_version_ack(packet),
            _ => Outcome::Ignored,
        }
    }

    fn on_greeting(&mut self) -> Outcome {
        self.state = SessionState::AwaitingVersionAck;
        Outcome::Reply(Packet::identify(&self.identity))
    }

    fn on_version_ack(&mut self, packet: &Packet) -> Outcome {
        let anomaly = match packet.reader().read_u8() {
            Some(VERSION_OK) => None,
            Some(flag) => Some(Error::ProtocolAnomaly(format!(
                "version is out of date (flag {flag})"
            ))),
            None => Some(Error::ProtocolAnomaly(
                "version ack without compatibility flag".into(),
            )),
        };
        self.state = SessionState::Established;
        Outcome::Established {
            reply: Packet::keepalive(),
            anomaly,
        }
    }
}

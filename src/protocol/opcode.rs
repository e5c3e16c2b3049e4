//! Gateway packet opcodes.

/// Packet opcode.
///
/// Only the opcodes that take part in the handshake get a variant; everything
/// else is carried through as [`Opcode::Other`] and ignored by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Opcode {
    /// Server greeting / module identification request (0x2001).
    Greeting,

    /// Server response to the client's identify packet (0xA100).
    ///
    /// First payload byte is `1` when the client version is accepted.
    VersionAck,

    /// Client identification (0x6100).
    Identify,

    /// Client keepalive (0x6101).
    Keepalive,

    /// Any opcode this client does not act on.
    ///
    /// Holds only unassigned values when built through [`Opcode::from_u16`];
    /// see [`Opcode::normalized`].
    Other(u16),
}

impl Opcode {
    /// Create an `Opcode` from its wire value.
    #[must_use]
    pub const fn from_u16(value: u16) -> Self {
        match value {
            0x2001 => Opcode::Greeting,
            0xA100 => Opcode::VersionAck,
            0x6100 => Opcode::Identify,
            0x6101 => Opcode::Keepalive,
            other => Opcode::Other(other),
        }
    }

    /// Get the wire value of this opcode.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Opcode::Greeting => 0x2001,
            Opcode::VersionAck => 0xA100,
            Opcode::Identify => 0x6100,
            Opcode::Keepalive => 0x6101,
            Opcode::Other(value) => value,
        }
    }

    /// Map `Other` wrapping an assigned value to its named variant.
    #[inline]
    #[must_use]
    pub const fn normalized(self) -> Self {
        Opcode::from_u16(self.as_u16())
    }

    /// Get human-readable name for this opcode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Greeting => "Greeting",
            Opcode::VersionAck => "VersionAck",
            Opcode::Identify => "Identify",
            Opcode::Keepalive => "Keepalive",
            Opcode::Other(_) => "Other",
        }
    }
}

impl From<u16> for Opcode {
    fn from(value: u16) -> Self {
        Opcode::from_u16(value)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#06x})", self.name(), self.as_u16())
    }
}

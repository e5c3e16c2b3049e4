//! Decoded packets exchanged between the codec and the session.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::config::ClientIdentity;
use crate::protocol::Opcode;

/// One logical gateway packet: an opcode and its payload.
///
/// Multi-byte payload fields are little-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet opcode.
    pub opcode: Opcode,
    payload: Bytes,
}

impl Packet {
    /// Create a packet from an opcode and payload.
    ///
    /// `Opcode::Other` holding an assigned value is replaced by the named
    /// variant, so packets compare equal exactly when they encode equally.
    #[must_use]
    pub fn new(opcode: Opcode, payload: impl Into<Bytes>) -> Self {
        Self {
            opcode: opcode.normalized(),
            payload: payload.into(),
        }
    }

    /// Create a packet with no payload.
    #[must_use]
    pub fn empty(opcode: Opcode) -> Self {
        Self::new(opcode, Bytes::new())
    }

    /// The fixed keepalive packet.
    #[must_use]
    pub fn keepalive() -> Self {
        Self::empty(Opcode::Keepalive)
    }

    /// Build the client identification packet.
    ///
    /// Layout: `u8 locale | u16 name length | name bytes | u32 version`.
    ///
    /// A name longer than [`ClientIdentity::MAX_NAME_LEN`] produces a packet
    /// the codec refuses to encode.
    #[must_use]
    pub fn identify(identity: &ClientIdentity) -> Self {
        let name = identity.name.as_bytes();
        let mut w = BytesMut::with_capacity(1 + 2 + name.len() + 4);
        w.put_u8(identity.locale);
        w.put_u16_le(u16::try_from(name.len()).unwrap_or(u16::MAX));
        w.put_slice(name);
        w.put_u32_le(identity.version);
        Self::new(Opcode::Identify, w.freeze())
    }

    /// Get the payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a cursor over the payload.
    #[must_use]
    pub fn reader(&self) -> PayloadReader {
        PayloadReader {
            buf: self.payload.clone(),
        }
    }
}

/// Bounds-checked little-endian reader over a packet payload.
///
/// Reads past the end return `None` instead of panicking.
#[derive(Debug, Clone)]
pub struct PayloadReader {
    buf: Bytes,
}

impl PayloadReader {
    pub fn read_u8(&mut self) -> Option<u8> {
        (self.buf.remaining() >= 1).then(|| self.buf.get_u8())
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        (self.buf.remaining() >= 2).then(|| self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        (self.buf.remaining() >= 4).then(|| self.buf.get_u32_le())
    }

    /// Read a `u16`-length-prefixed ASCII string.
    pub fn read_ascii(&mut self) -> Option<String> {
        let len = self.read_u16()? as usize;
        if self.buf.remaining() < len {
            return None;
        }
        let raw = self.buf.split_to(len);
        Some(raw.iter().map(|&b| b as char).collect())
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }
}

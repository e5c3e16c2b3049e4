use std::collections::VecDeque;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::protocol::{Opcode, Packet};

/// Frame header: `u16 size | u16 opcode | u8 security count | u8 crc`.
pub const HEADER_LEN: usize = 6;

/// Largest payload a single frame may carry.
pub const MAX_PAYLOAD: usize = 4090;

const ENCRYPTED_FLAG: u16 = 0x8000;

/// Plaintext gateway framing.
///
/// Header fields are little-endian. The high bit of `size` marks an encrypted
/// frame; those are rejected since this codec carries no cipher state.
#[derive(Debug, Default)]
pub struct FrameCodec {
    read_buf: BytesMut,
    inbound: VecDeque<Packet>,
    outbound: VecDeque<Bytes>,
}

impl FrameCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            read_buf: BytesMut::with_capacity(capacity),
            inbound: VecDeque::new(),
            outbound: VecDeque::new(),
        }
    }

    /// Encode a single packet into a standalone buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`] if the payload exceeds [`MAX_PAYLOAD`].
    pub fn encode(packet: &Packet) -> Result<Bytes> {
        let payload = packet.payload();
        if payload.len() > MAX_PAYLOAD {
            return Err(Error::Codec(format!(
                "payload too large: {} bytes (max: {MAX_PAYLOAD})",
                payload.len()
            )));
        }

        let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
        buf.put_u16_le(payload.len() as u16);
        buf.put_u16_le(packet.opcode.as_u16());
        buf.put_u8(0);
        buf.put_u8(0);
        buf.put_slice(payload);
        Ok(buf.freeze())
    }

    /// Number of bytes buffered but not yet decoded.
    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.read_buf.len()
    }

    fn decode_frames(&mut self) -> Result<()> {
        while self.read_buf.len() >= HEADER_LEN {
            let raw_size = u16::from_le_bytes([self.read_buf[0], self.read_buf[1]]);
            if raw_size & ENCRYPTED_FLAG != 0 {
                return Err(Error::Codec("encrypted frames are not supported".into()));
            }

            let size = (raw_size & !ENCRYPTED_FLAG) as usize;
            if size > MAX_PAYLOAD {
                return Err(Error::Codec(format!(
                    "payload too large: {size} bytes (max: {MAX_PAYLOAD})"
                )));
            }
            if self.read_buf.len() < HEADER_LEN + size {
                break;
            }

            let mut frame = self.read_buf.split_to(HEADER_LEN + size);
            frame.advance(2);
            let opcode = Opcode::from_u16(frame.get_u16_le());
            frame.advance(2);
            self.inbound.push_back(Packet::new(opcode, frame.freeze()));
        }
        Ok(())
    }
}

impl Codec for FrameCodec {
    fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        self.read_buf.extend_from_slice(bytes);
        self.decode_frames()
    }

    fn next_packet(&mut self) -> Option<Packet> {
        self.inbound.pop_front()
    }

    fn queue(&mut self, packet: Packet) -> Result<()> {
        let encoded = Self::encode(&packet)?;
        self.outbound.push_back(encoded);
        Ok(())
    }

    fn next_outbound(&mut self) -> Option<Bytes> {
        self.outbound.pop_front()
    }
}

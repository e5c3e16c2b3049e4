//! Packet codec between the raw byte stream and decoded packets.
//!
//! A codec is owned by exactly one session and is only touched from inside
//! that session's strand, so implementations need no internal locking.

mod framed;

pub use framed::{FrameCodec, HEADER_LEN, MAX_PAYLOAD};

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::Packet;

/// Stateful transformer between wire bytes and [`Packet`]s.
pub trait Codec: Send + 'static {
    /// Feed bytes received from the transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`](crate::Error::Codec) when the stream cannot be
    /// decoded. The session treats this as a transport failure.
    fn feed(&mut self, bytes: &[u8]) -> Result<()>;

    /// Pop the next fully decoded inbound packet.
    fn next_packet(&mut self) -> Option<Packet>;

    /// Encode a packet for sending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`](crate::Error::Codec) if the packet cannot be framed.
    fn queue(&mut self, packet: Packet) -> Result<()>;

    /// Pop the next encoded buffer ready to be written.
    fn next_outbound(&mut self) -> Option<Bytes>;
}

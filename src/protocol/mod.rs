//! Gateway handshake protocol: opcodes, packets and the session state machine.

pub mod handshake;
pub mod opcode;
pub mod packet;

pub use handshake::{Handshake, Outcome, SessionState, VERSION_OK};
pub use opcode::Opcode;
pub use packet::{Packet, PayloadReader};

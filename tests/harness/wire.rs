//! Packet helpers shared by the integration tests.

use std::time::Duration;

use gwstress::{Codec, FrameCodec, Opcode, Packet};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Encode one packet as it appears on the wire.
pub fn frame(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    FrameCodec::encode(&Packet::new(opcode, payload.to_vec()))
        .unwrap()
        .to_vec()
}

/// Read and decode everything that arrives before the stream goes quiet
/// for `quiet` or reaches EOF.
pub async fn drain_packets<R: AsyncRead + Unpin>(reader: &mut R, quiet: Duration) -> Vec<Packet> {
    let mut codec = FrameCodec::new();
    let mut buf = [0u8; 1024];
    let mut packets = Vec::new();

    loop {
        match tokio::time::timeout(quiet, reader.read(&mut buf)).await {
            Ok(Ok(0)) | Ok(Err(_)) | Err(_) => break,
            Ok(Ok(n)) => {
                codec.feed(&buf[..n]).unwrap();
                while let Some(packet) = codec.next_packet() {
                    packets.push(packet);
                }
            }
        }
    }
    packets
}

/// Poll `check` every 10 ms until it holds or `limit` passes.
pub async fn wait_until<F: FnMut() -> bool>(limit: Duration, mut check: F) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

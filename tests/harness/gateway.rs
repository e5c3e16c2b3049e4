//! Fake gateway for integration testing.
//!
//! Every accepted connection is greeted, answered with a version ack once it
//! identifies, and has its keepalives counted.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gwstress::{Codec, FrameCodec, Opcode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::frame;

#[derive(Debug, Default)]
pub struct GatewayStats {
    accepted: AtomicUsize,
    identified: AtomicUsize,
    keepalives: AtomicUsize,
    disconnected: AtomicUsize,
}

impl GatewayStats {
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn identified(&self) -> usize {
        self.identified.load(Ordering::Relaxed)
    }

    pub fn keepalives(&self) -> usize {
        self.keepalives.load(Ordering::Relaxed)
    }

    pub fn disconnected(&self) -> usize {
        self.disconnected.load(Ordering::Relaxed)
    }
}

pub struct FakeGateway {
    addr: SocketAddr,
    stats: Arc<GatewayStats>,
    kick: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl FakeGateway {
    /// Listen on a random local port. `version_flag` is sent in every ack.
    pub async fn spawn(version_flag: u8) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = Arc::new(GatewayStats::default());
        let (kick, kicked) = watch::channel(false);

        let task = {
            let stats = stats.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    stats.accepted.fetch_add(1, Ordering::Relaxed);
                    tokio::spawn(serve_peer(
                        stream,
                        version_flag,
                        stats.clone(),
                        kicked.clone(),
                    ));
                }
            })
        };

        Self {
            addr,
            stats,
            kick,
            task,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn stats(&self) -> &GatewayStats {
        &self.stats
    }

    /// Drop every open connection.
    pub fn kick_all(&self) {
        let _ = self.kick.send(true);
    }

    pub async fn shutdown(self) {
        self.kick_all();
        self.task.abort();
        let _ = self.task.await;
    }
}

async fn serve_peer(
    stream: TcpStream,
    version_flag: u8,
    stats: Arc<GatewayStats>,
    mut kicked: watch::Receiver<bool>,
) {
    let (mut rd, mut wr) = stream.into_split();
    if wr.write_all(&frame(Opcode::Greeting, &[1])).await.is_err() {
        return;
    }

    let mut codec = FrameCodec::new();
    let mut buf = [0u8; 1024];
    loop {
        tokio::select! {
            read = rd.read(&mut buf) => {
                let n = match read {
                    Ok(0) | Err(_) => {
                        stats.disconnected.fetch_add(1, Ordering::Relaxed);
                        return;
                    }
                    Ok(n) => n,
                };
                if codec.feed(&buf[..n]).is_err() {
                    return;
                }
                while let Some(packet) = codec.next_packet() {
                    match packet.opcode {
                        Opcode::Identify => {
                            stats.identified.fetch_add(1, Ordering::Relaxed);
                            let ack = frame(Opcode::VersionAck, &[version_flag]);
                            if wr.write_all(&ack).await.is_err() {
                                return;
                            }
                        }
                        Opcode::Keepalive => {
                            stats.keepalives.fetch_add(1, Ordering::Relaxed);
                        }
                        _ => {}
                    }
                }
            }
            _ = kicked.changed() => return,
        }
    }
}

//! One simulated client: transport, codec and handshake state.
//!
//! ## Lifecycle
//!
//! 1. [`Session::connect`] opens the transport and arms the first read.
//! 2. The reader task feeds inbound bytes into the codec through the strand.
//! 3. The scheduler calls [`Session::process`] every tick; decoded packets go
//!    through the handshake machine and queued replies are written out.
//! 4. Any read or write fault closes the session; the next `process` returns
//!    `false` and the scheduler drops it.
//!
//! Writes are awaited inside the strand during `process`, so a peer that stops
//! reading stalls the scheduler tick. Write volume is a handful of bytes per
//! second per session, which keeps this cheap; higher volumes would need a
//! dedicated writer task per session.

mod strand;

pub use strand::{Strand, WeakStrand};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};

use crate::codec::{Codec, FrameCodec};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::spawn_guarded;
use crate::protocol::{Handshake, Outcome, Packet, SessionState};
use crate::resolve;
use crate::stats::Stats;

/// Byte stream a session can run over.
pub trait Transport: AsyncRead + AsyncWrite + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Send + 'static> Transport for T {}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mutable session state. Only reachable through the session's strand.
struct Core<T, C> {
    id: SessionId,
    writer: Option<WriteHalf<T>>,
    codec: C,
    handshake: Handshake,
    keepalive: Option<JoinHandle<()>>,
    keepalive_period: Duration,
    stats: Arc<Stats>,
}

impl<T: Transport, C: Codec> Core<T, C> {
    /// Queue `packet` for the next flush. Returns `false` if it cannot be encoded.
    fn enqueue(&mut self, packet: Packet) -> bool {
        let opcode = packet.opcode;
        match self.codec.queue(packet) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(session = %self.id, %opcode, "cannot queue outbound packet: {e}");
                false
            }
        }
    }

    /// Write every encoded buffer the codec has ready.
    ///
    /// Returns `false` if the transport is gone or a write failed.
    async fn flush(&mut self) -> bool {
        let mut wrote = false;
        while let Some(bytes) = self.codec.next_outbound() {
            let Some(writer) = self.writer.as_mut() else {
                return false;
            };
            if let Err(e) = writer.write_all(&bytes).await {
                let fault = Error::Transport(e.to_string());
                tracing::warn!(session = %self.id, "write failed: {fault}");
                self.close().await;
                return false;
            }
            self.stats.packet_sent(bytes.len());
            wrote = true;
        }

        if wrote {
            if let Some(writer) = self.writer.as_mut() {
                if let Err(e) = writer.flush().await {
                    tracing::warn!(session = %self.id, "flush failed: {e}");
                    self.close().await;
                    return false;
                }
            }
        }
        true
    }

    /// Release the transport. Safe to call more than once.
    async fn close(&mut self) {
        self.handshake.close();
        if let Some(keepalive) = self.keepalive.take() {
            keepalive.abort();
        }
        if let Some(mut writer) = self.writer.take() {
            tracing::info!(session = %self.id, "connection closed");
            self.stats.connection_closed();
            let _ = writer.shutdown().await;
        }
    }
}

/// One client connection with its own codec and handshake state.
pub struct Session<T, C = FrameCodec> {
    id: SessionId,
    strand: Strand<Core<T, C>>,
    reader: AbortHandle,
}

impl Session<TcpStream, FrameCodec> {
    /// Resolve, connect and start reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the host has no usable address and
    /// [`Error::Connect`] if no address accepted the connection.
    pub async fn connect(config: &Config, stats: Arc<Stats>) -> Result<Self> {
        stats.connection_attempted();
        let stream = match resolve::open_transport(&config.server, config.port).await {
            Ok(stream) => stream,
            Err(e) => {
                stats.connection_failed();
                return Err(e);
            }
        };
        let codec = FrameCodec::with_capacity(config.read_buffer_size);
        Ok(Self::from_stream(stream, codec, config, stats))
    }
}

impl<T: Transport, C: Codec> Session<T, C> {
    /// Wrap an already-open stream and arm the first read.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn from_stream(stream: T, codec: C, config: &Config, stats: Arc<Stats>) -> Self {
        let id = SessionId::next();
        let (read_half, write_half) = tokio::io::split(stream);

        let mut handshake = Handshake::new(config.identity.clone());
        handshake.transport_opened();
        stats.connection_opened();
        tracing::debug!(session = %id, "transport open");

        let strand = Strand::new(Core {
            id,
            writer: Some(write_half),
            codec,
            handshake,
            keepalive: None,
            keepalive_period: config.timings.keepalive,
            stats,
        });

        let buf = vec![0u8; config.read_buffer_size.max(1)];
        let reader = spawn_guarded("session-read", read_loop(strand.clone(), read_half, buf));

        Self {
            id,
            strand,
            reader: reader.abort_handle(),
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current protocol state.
    pub async fn state(&self) -> SessionState {
        self.strand.enter().await.handshake.state()
    }

    /// Run buffered inbound packets through the handshake and write replies.
    ///
    /// Returns `false` once the transport is known to be broken.
    pub async fn process(&self) -> bool {
        let mut guard = self.strand.enter().await;
        let core = &mut *guard;
        if core.writer.is_none() {
            return false;
        }

        // An unsendable handshake reply ends the session.
        let mut stuck = false;
        while let Some(packet) = core.codec.next_packet() {
            core.stats.packet_received();
            tracing::debug!(
                session = %core.id,
                opcode = %packet.opcode,
                len = packet.payload().len(),
                "recv"
            );

            match core.handshake.dispatch(&packet) {
                Outcome::Ignored => {}
                Outcome::Reply(reply) => {
                    if !core.enqueue(reply) {
                        stuck = true;
                        break;
                    }
                }
                Outcome::Established { reply, anomaly } => {
                    if let Some(notice) = anomaly {
                        tracing::info!(session = %core.id, "{notice}");
                    }
                    if !core.enqueue(reply) {
                        stuck = true;
                        break;
                    }
                    core.stats.keepalive_sent();
                    core.stats.handshake_completed();
                    tracing::debug!(session = %core.id, "handshake established");

                    let period = core.keepalive_period;
                    let timer = keepalive_loop(self.strand.downgrade(), period);
                    core.keepalive = Some(spawn_guarded("session-keepalive", timer));
                }
            }
        }

        let alive = if stuck {
            core.close().await;
            false
        } else {
            core.flush().await
        };
        drop(guard);
        if !alive {
            self.reader.abort();
        }
        alive
    }

    /// Shut down and release the transport. Idempotent.
    pub async fn close(&self) {
        self.strand.enter().await.close().await;
        self.reader.abort();
    }
}

impl<T, C> Drop for Session<T, C> {
    fn drop(&mut self) {
        self.reader.abort();
        if let Some(mut core) = self.strand.try_enter() {
            if let Some(keepalive) = core.keepalive.take() {
                keepalive.abort();
            }
        }
    }
}

impl<T, C> std::fmt::Debug for Session<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish_non_exhaustive()
    }
}

async fn read_loop<T: Transport, C: Codec>(
    strand: Strand<Core<T, C>>,
    mut reader: ReadHalf<T>,
    mut buf: Vec<u8>,
) {
    loop {
        let result = reader.read(&mut buf).await;

        let mut core = strand.enter().await;
        if !core.handshake.state().is_active() {
            return;
        }

        let fault = match result {
            Ok(0) => Error::Transport("closed by peer".into()),
            Ok(n) => {
                core.stats.bytes_received(n);
                match core.codec.feed(&buf[..n]) {
                    Ok(()) => continue,
                    Err(e) => e,
                }
            }
            Err(e) => Error::Transport(e.to_string()),
        };

        tracing::debug!(session = %core.id, "read side failed: {fault}");
        core.close().await;
        return;
    }
}

async fn keepalive_loop<T: Transport, C: Codec>(strand: WeakStrand<Core<T, C>>, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let Some(live) = strand.upgrade() else {
            return;
        };
        let mut core = live.enter().await;
        if !core.handshake.state().is_active() {
            return;
        }
        if core.enqueue(Packet::keepalive()) {
            core.stats.keepalive_sent();
        }
    }
}

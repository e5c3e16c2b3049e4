//! Run-wide counters shared by every session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for one stress run.
///
/// All updates use relaxed ordering; the numbers are only read for reporting.
#[derive(Debug, Default)]
pub struct Stats {
    connections_attempted: AtomicU64,
    connections_opened: AtomicU64,
    connections_failed: AtomicU64,
    connections_closed: AtomicU64,
    handshakes_completed: AtomicU64,
    packets_received: AtomicU64,
    packets_sent: AtomicU64,
    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,
    keepalives_sent: AtomicU64,
}

/// Point-in-time copy of [`Stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub connections_attempted: u64,
    pub connections_opened: u64,
    pub connections_failed: u64,
    pub connections_closed: u64,
    pub handshakes_completed: u64,
    pub packets_received: u64,
    pub packets_sent: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub keepalives_sent: u64,
}

impl Snapshot {
    /// Sessions opened and not yet closed.
    #[must_use]
    pub fn active(&self) -> u64 {
        self.connections_opened.saturating_sub(self.connections_closed)
    }
}

impl Stats {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connection_attempted(&self) {
        self.connections_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_failed(&self) {
        self.connections_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handshake_completed(&self) {
        self.handshakes_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_received(&self, n: usize) {
        self.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn packet_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_sent(&self, size: usize) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn keepalive_sent(&self) {
        self.keepalives_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            connections_attempted: self.connections_attempted.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_failed: self.connections_failed.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            handshakes_completed: self.handshakes_completed.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            keepalives_sent: self.keepalives_sent.load(Ordering::Relaxed),
        }
    }

    /// Log the current counters at `info`.
    pub fn report(&self, live: usize) {
        let s = self.snapshot();
        tracing::info!(
            live,
            attempted = s.connections_attempted,
            opened = s.connections_opened,
            failed = s.connections_failed,
            closed = s.connections_closed,
            established = s.handshakes_completed,
            packets_in = s.packets_received,
            packets_out = s.packets_sent,
            bytes_in = s.bytes_received,
            bytes_out = s.bytes_sent,
            keepalives = s.keepalives_sent,
            "stats"
        );
    }
}

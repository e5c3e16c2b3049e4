//! Periodic driver for every live session.
//!
//! The [`Scheduler`] is the only owner of the [`Registry`]. New sessions are
//! handed over through a [`SchedulerHandle`] and adopted at the start of the
//! next tick, so the registry is only ever touched from inside `tick`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::codec::{Codec, FrameCodec};
use crate::config::Config;
use crate::error::Error;
use crate::executor::panic_message;
use crate::session::{Session, SessionId, Transport};
use crate::stats::Stats;

/// Ordered collection of live sessions.
pub struct Registry<T, C = FrameCodec> {
    sessions: Vec<Session<T, C>>,
}

impl<T: Transport, C: Codec> Registry<T, C> {
    fn new() -> Self {
        Self {
            sessions: Vec::new(),
        }
    }

    /// Add a session; returns `false` if its id is already present.
    fn insert(&mut self, session: Session<T, C>) -> bool {
        if self.sessions.iter().any(|s| s.id() == session.id()) {
            return false;
        }
        self.sessions.push(session);
        true
    }

    /// Process every session once, dropping those that report a dead transport.
    ///
    /// Returns the number of sessions removed.
    async fn process_all(&mut self) -> usize {
        let before = self.sessions.len();
        let mut i = 0;
        while i < self.sessions.len() {
            if self.sessions[i].process().await {
                i += 1;
            } else {
                let dead = self.sessions.remove(i);
                tracing::debug!(session = %dead.id(), "removed from registry");
            }
        }
        before - self.sessions.len()
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(Session::id).collect()
    }
}

/// Sender side used by the launcher to hand sessions to the scheduler.
pub struct SchedulerHandle<T, C = FrameCodec> {
    tx: mpsc::UnboundedSender<Session<T, C>>,
}

impl<T, C> Clone for SchedulerHandle<T, C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T, C> SchedulerHandle<T, C> {
    /// Queue a session for adoption on the next tick.
    ///
    /// Returns `false` if the scheduler is gone; the session is dropped.
    pub fn submit(&self, session: Session<T, C>) -> bool {
        self.tx.send(session).is_ok()
    }
}

/// Owner of the registry and its recurring tick.
pub struct Scheduler<T, C = FrameCodec> {
    registry: Registry<T, C>,
    intake: mpsc::UnboundedReceiver<Session<T, C>>,
    tick_period: Duration,
    report_period: Duration,
    stats: Arc<Stats>,
}

impl<T: Transport, C: Codec> Scheduler<T, C> {
    #[must_use]
    pub fn new(config: &Config, stats: Arc<Stats>) -> (Self, SchedulerHandle<T, C>) {
        let (tx, intake) = mpsc::unbounded_channel();
        let scheduler = Self {
            registry: Registry::new(),
            intake,
            tick_period: config.timings.tick,
            report_period: config.timings.report,
            stats,
        };
        (scheduler, SchedulerHandle { tx })
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Ids of the live sessions, in registry order.
    #[must_use]
    pub fn ids(&self) -> Vec<SessionId> {
        self.registry.ids()
    }

    /// One scheduler pass: adopt submitted sessions, then process all of them.
    ///
    /// Returns the number of sessions removed.
    pub async fn tick(&mut self) -> usize {
        while let Ok(session) = self.intake.try_recv() {
            let id = session.id();
            if !self.registry.insert(session) {
                tracing::warn!(session = %id, "duplicate session submitted, dropping");
            }
        }
        self.registry.process_all().await
    }

    /// Tick forever at the configured cadence.
    ///
    /// A panicking tick is logged and the timer re-armed.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut next_report = Instant::now() + self.report_period;

        loop {
            ticker.tick().await;

            if let Err(panic) = AssertUnwindSafe(self.tick()).catch_unwind().await {
                let fault = Error::ReactorFault(panic_message(panic.as_ref()));
                tracing::error!("scheduler tick faulted: {fault}");
            }

            if Instant::now() >= next_report {
                self.stats.report(self.registry.len());
                next_report = Instant::now() + self.report_period;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SessionState;
    use tokio::io::DuplexStream;

    fn duplex_session(stats: &Arc<Stats>) -> (Session<DuplexStream>, DuplexStream) {
        let (client, server) = tokio::io::duplex(1024);
        let config = Config::new("test", 0);
        let session = Session::from_stream(client, FrameCodec::new(), &config, stats.clone());
        (session, server)
    }

    #[tokio::test]
    async fn test_tick_adopts_submitted_sessions() {
        let stats = Stats::new();
        let (mut scheduler, handle) =
            Scheduler::<DuplexStream, FrameCodec>::new(&Config::new("test", 0), stats.clone());

        let mut peers = Vec::new();
        for _ in 0..5 {
            let (session, server) = duplex_session(&stats);
            assert!(handle.submit(session));
            peers.push(server);
        }
        assert!(scheduler.is_empty());

        assert_eq!(scheduler.tick().await, 0);
        assert_eq!(scheduler.len(), 5);
    }

    #[tokio::test]
    async fn test_dead_sessions_removed_without_skipping() {
        let stats = Stats::new();
        let (mut scheduler, handle) =
            Scheduler::<DuplexStream, FrameCodec>::new(&Config::new("test", 0), stats.clone());

        let mut sessions = Vec::new();
        let mut peers = Vec::new();
        for _ in 0..6 {
            let (session, server) = duplex_session(&stats);
            sessions.push(session);
            peers.push(server);
        }

        // Close two neighbours and the last one before adoption.
        for idx in [1usize, 2, 5] {
            sessions[idx].close().await;
            assert_eq!(sessions[idx].state().await, SessionState::Closed);
        }
        let expected: Vec<SessionId> = [0usize, 3, 4].iter().map(|&i| sessions[i].id()).collect();

        for session in sessions {
            handle.submit(session);
        }

        assert_eq!(scheduler.tick().await, 3);
        assert_eq!(scheduler.ids(), expected);

        assert_eq!(scheduler.tick().await, 0);
        assert_eq!(scheduler.len(), 3);
        assert_eq!(stats.snapshot().connections_closed, 3);
    }

    #[tokio::test]
    async fn test_registry_keeps_insertion_order() {
        let stats = Stats::new();
        let mut registry = Registry::<DuplexStream, FrameCodec>::new();
        let mut ids = Vec::new();
        let mut peers = Vec::new();
        for _ in 0..3 {
            let (session, server) = duplex_session(&stats);
            ids.push(session.id());
            assert!(registry.insert(session));
            peers.push(server);
        }

        assert_eq!(registry.ids(), ids);
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_submit_after_scheduler_dropped() {
        let stats = Stats::new();
        let (scheduler, handle) =
            Scheduler::<DuplexStream, FrameCodec>::new(&Config::new("test", 0), stats.clone());
        drop(scheduler);

        let (session, _server) = duplex_session(&stats);
        assert!(!handle.submit(session));
    }
}

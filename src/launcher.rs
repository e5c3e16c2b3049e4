//! Staggered creation of the requested number of sessions.

use std::sync::Arc;

use tokio::net::TcpStream;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::scheduler::SchedulerHandle;
use crate::session::Session;
use crate::stats::Stats;

/// Opens sessions one at a time and hands them to the scheduler.
pub struct Launcher {
    config: Config,
    stats: Arc<Stats>,
}

impl Launcher {
    #[must_use]
    pub fn new(config: Config, stats: Arc<Stats>) -> Self {
        Self { config, stats }
    }

    /// Connect `config.connections` sessions, pausing `timings.stagger`
    /// between attempts so the target does not see a connect burst.
    ///
    /// Stops at the first session that fails to connect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameTooLong`] before connecting anything if the
    /// identity cannot be encoded, the failing session's
    /// [`Error::Resolution`] or [`Error::Connect`], or
    /// [`Error::ReactorFault`] if the scheduler has already stopped.
    pub async fn launch(&self, handle: &SchedulerHandle<TcpStream>) -> Result<usize> {
        self.config.validate()?;
        let total = self.config.connections as usize;
        tracing::info!(
            server = %self.config.server,
            port = self.config.port,
            connections = total,
            "launching sessions"
        );

        for n in 1..=total {
            let session = match Session::connect(&self.config, self.stats.clone()).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!(attempt = n, "session failed to initialize: {e}");
                    return Err(e);
                }
            };
            tracing::debug!(session = %session.id(), "connected {n}/{total}");

            if !handle.submit(session) {
                return Err(Error::ReactorFault("scheduler is not running".into()));
            }
            tokio::time::sleep(self.config.timings.stagger).await;
        }

        tracing::info!(connections = total, "all sessions launched");
        Ok(total)
    }
}

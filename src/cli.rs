//! Command-line arguments.

use clap::Parser;

use crate::config::{Config, DEFAULT_CONNECTIONS};
use crate::executor::default_workers;

/// Printed when `--server` or `--port` is absent.
pub const MISSING_TARGET: &str =
    "Missing --server and --port\nRun with --help for a list of arguments";

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "gwstress")]
#[command(about = "Open many concurrent clients against a gateway and keep them alive", long_about = None)]
pub struct Args {
    /// Sets the gateway host
    #[arg(long)]
    pub server: Option<String>,

    /// Sets the gateway port
    #[arg(long)]
    pub port: Option<u16>,

    /// Sets the number of connections
    #[arg(long, default_value_t = DEFAULT_CONNECTIONS)]
    pub connections: u16,

    /// Sets the thread count (one of them is the main thread)
    #[arg(long, allow_negative_numbers = true)]
    pub threads: Option<i32>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Worker threads for the runtime: `--threads` minus the main thread,
    /// at least 1.
    #[must_use]
    pub fn workers(&self) -> usize {
        match self.threads {
            Some(threads) => threads.saturating_sub(1).max(1) as usize,
            None => default_workers(),
        }
    }

    /// Build the run configuration, or `None` if the target is incomplete.
    #[must_use]
    pub fn into_config(self) -> Option<Config> {
        let workers = self.workers();
        let server = self.server?;
        let port = self.port?;
        Some(
            Config::new(server, port)
                .with_connections(self.connections)
                .with_workers(workers),
        )
    }
}

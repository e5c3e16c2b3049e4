//! # gwstress - concurrent gateway client emulator
//!
//! `gwstress` opens a configurable number of client sessions against one
//! gateway endpoint and keeps each of them alive through the gateway's
//! handshake and keepalive protocol. It is meant for load-testing how many
//! connections and handshakes the target can sustain.
//!
//! ## Architecture
//!
//! - A shared tokio runtime ([`executor`]) drives every session's reads and
//!   timers on a small pool of worker threads.
//! - Each [`Session`] serializes all work on its own state through a
//!   [`Strand`](session::Strand), so different sessions proceed in parallel
//!   while one session never sees two operations at once.
//! - A single [`Scheduler`] owns the live-session registry and, every tick,
//!   processes each session and drops the dead ones.
//! - The [`Launcher`] opens the sessions one by one with a short stagger.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gwstress::{Config, Executor, FrameCodec, Launcher, Scheduler, Stats};
//! use tokio::net::TcpStream;
//!
//! let config = Config::new("127.0.0.1", 15779).with_connections(100);
//! let executor = Executor::new(config.workers)?;
//! executor.block_on(async move {
//!     let stats = Stats::new();
//!     let (scheduler, handle) = Scheduler::<TcpStream, FrameCodec>::new(&config, stats.clone());
//!     tokio::spawn(scheduler.run());
//!     Launcher::new(config, stats).launch(&handle).await
//! })?;
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod executor;
pub mod launcher;
pub mod logging;
pub mod protocol;
pub mod resolve;
pub mod scheduler;
pub mod session;
pub mod stats;

pub use codec::{Codec, FrameCodec};
pub use config::{ClientIdentity, Config, Timings};
pub use error::{Error, Result};
pub use executor::{Executor, spawn_guarded};
pub use launcher::Launcher;
pub use protocol::{Opcode, Packet, SessionState};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use session::{Session, SessionId};
pub use stats::Stats;

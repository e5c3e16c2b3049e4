use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpStream;

use gwstress::cli::{Args, MISSING_TARGET};
use gwstress::{Config, Executor, FrameCodec, Launcher, Scheduler, Stats, logging, spawn_guarded};

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_tracing(&args.log_level);

    let Some(config) = args.into_config() else {
        println!("{MISSING_TARGET}");
        return ExitCode::SUCCESS;
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(config: Config) -> Result<()> {
    let executor = Executor::new(config.workers).context("start worker pool")?;
    tracing::info!(workers = executor.workers(), "worker pool ready");

    executor.block_on(drive(config))
}

async fn drive(config: Config) -> Result<()> {
    let stats = Stats::new();
    let (scheduler, handle) = Scheduler::<TcpStream, FrameCodec>::new(&config, stats.clone());
    let ticking = spawn_guarded("scheduler", scheduler.run());

    Launcher::new(config, stats)
        .launch(&handle)
        .await
        .context("launch sessions")?;

    tokio::select! {
        _ = ticking => tracing::warn!("scheduler stopped"),
        signal = tokio::signal::ctrl_c() => {
            signal.context("wait for ctrl-c")?;
            tracing::info!("interrupted, exiting");
        }
    }
    Ok(())
}

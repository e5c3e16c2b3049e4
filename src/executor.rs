//! Shared worker pool driving every session's reads and timers.
//!
//! The pool is a tokio multi-thread runtime. The thread that calls
//! [`Executor::block_on`] drives the runtime as well, which is why the default
//! worker count is one less than the available parallelism.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Available parallelism minus one, at least 1.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// Fixed-size pool of I/O worker threads over one reactor.
pub struct Executor {
    runtime: Runtime,
    workers: usize,
}

impl Executor {
    /// Build a runtime with `workers` threads (at least 1).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReactorFault`] if the runtime cannot be created.
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("gwstress-worker")
            .enable_all()
            .build()
            .map_err(|e| Error::ReactorFault(e.to_string()))?;
        tracing::debug!(workers, "executor started");
        Ok(Self { runtime, workers })
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Drive `future` to completion on the calling thread.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Spawn `future` on the current runtime, catching and logging any panic.
///
/// A panic ends only this task; the worker thread keeps serving others.
///
/// # Panics
///
/// Panics if called outside a tokio runtime, like `tokio::spawn`.
pub fn spawn_guarded<F>(label: &'static str, future: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(panic) = AssertUnwindSafe(future).catch_unwind().await {
            let fault = Error::ReactorFault(panic_message(panic.as_ref()));
            tracing::error!(task = label, "{fault}");
        }
    })
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("callback panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("callback panicked: {s}")
    } else {
        "callback panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_default_workers_at_least_one() {
        assert!(default_workers() >= 1);
    }

    #[test]
    fn test_executor_clamps_zero_workers() {
        let executor = Executor::new(0).unwrap();
        assert_eq!(executor.workers(), 1);
        assert_eq!(executor.block_on(async { 7 }), 7);
    }

    #[test]
    fn test_executor_runs_on_named_workers() {
        let executor = Executor::new(2).unwrap();
        let name = executor.block_on(async {
            tokio::spawn(async { std::thread::current().name().map(str::to_owned) })
                .await
                .unwrap()
        });
        assert_eq!(name.as_deref(), Some("gwstress-worker"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_callback_is_contained() {
        let ran = Arc::new(AtomicUsize::new(0));

        let faulty = spawn_guarded("faulty", async {
            panic!("boom");
        });
        assert!(faulty.await.is_ok());

        let counter = ran.clone();
        spawn_guarded("healthy", async move {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .await
        .unwrap();

        assert_eq!(ran.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "callback panicked: boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "callback panicked: bang");
        let boxed: Box<dyn Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(boxed.as_ref()), "callback panicked");
    }
}

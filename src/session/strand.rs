//! Per-session serialization token.
//!
//! Every operation on a session (read completion, keepalive firing, scheduler
//! processing, close) enters the session's strand first. At most one of them
//! is inside at any time, whichever worker thread it runs on. Operations on
//! different sessions use different strands and run in parallel.

use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, MutexGuard};

/// Exclusive-access token around a session's mutable state.
#[derive(Debug)]
pub struct Strand<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for Strand<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Strand<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Wait for exclusive access.
    pub async fn enter(&self) -> MutexGuard<'_, T> {
        self.inner.lock().await
    }

    /// Enter only if no other operation is inside.
    pub fn try_enter(&self) -> Option<MutexGuard<'_, T>> {
        self.inner.try_lock().ok()
    }

    /// A handle that does not keep the state alive.
    pub fn downgrade(&self) -> WeakStrand<T> {
        WeakStrand {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Non-owning strand handle held by timers.
#[derive(Debug)]
pub struct WeakStrand<T> {
    inner: Weak<Mutex<T>>,
}

impl<T> Clone for WeakStrand<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> WeakStrand<T> {
    /// `None` once the owning session is gone.
    pub fn upgrade(&self) -> Option<Strand<T>> {
        self.inner.upgrade().map(|inner| Strand { inner })
    }
}

//! Cooperative cancellation for suspended robot threads.
//!
//! Rust threads cannot be interrupted from outside, so every suspension point
//! a robot can be parked in (travel, pick, drop, charge, station waits) sleeps
//! on a `CancelToken` instead of `thread::sleep`.  Calling
//! [`CancelToken::cancel`] wakes the sleeper immediately and makes the sleep
//! return [`Interrupted`], together with how long it actually slept so the
//! caller can account for partial progress.
//!
//! Code that blocks on its own condvar instead (station pools) registers a
//! [`Notify`] for the duration of the wait and is woken through it.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Returned by an interrupted sleep.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Interrupted {
    /// Time spent suspended before the interruption.
    pub elapsed: Duration,
}

/// Something blocked elsewhere that must be woken when a token is cancelled.
///
/// `notify` is called without the token's lock held.  An implementation that
/// guards a condvar should take that condvar's mutex before notifying, so a
/// waiter between its flag check and its wait cannot miss the wake-up.
pub trait Notify: Send + Sync {
    fn notify(&self);
}

#[derive(Default)]
struct State {
    cancelled: bool,
    watchers:  Vec<(u64, Arc<dyn Notify>)>,
    next_id:   u64,
}

#[derive(Default)]
struct Flag {
    state:   Mutex<State>,
    changed: Condvar,
}

/// Clonable cancellation flag shared between a robot thread and whoever may
/// interrupt it.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Flag>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().expect("cancel flag mutex poisoned")
    }

    /// Raise the flag and wake every sleeper and registered watcher.
    pub fn cancel(&self) {
        let watchers: Vec<Arc<dyn Notify>> = {
            let mut guard = self.lock();
            guard.cancelled = true;
            self.inner.changed.notify_all();
            guard.watchers.iter().map(|(_, w)| Arc::clone(w)).collect()
        };
        for watcher in watchers {
            watcher.notify();
        }
    }

    /// Clear the flag so the next suspension runs normally.
    pub fn reset(&self) {
        self.lock().cancelled = false;
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Have `watcher` notified on every [`cancel`](Self::cancel) until the
    /// returned guard is dropped.
    pub fn watch(&self, watcher: Arc<dyn Notify>) -> Watch<'_> {
        let mut guard = self.lock();
        let id = guard.next_id;
        guard.next_id += 1;
        guard.watchers.push((id, watcher));
        Watch { token: self, id }
    }

    /// Suspend for `duration` unless cancelled first.
    ///
    /// Returns immediately with `Err` if the flag is already raised.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let start = Instant::now();
        let deadline = start + duration;
        let mut guard = self.lock();
        loop {
            if guard.cancelled {
                return Err(Interrupted { elapsed: start.elapsed() });
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            // Spurious wakeups just loop back and re-check both conditions.
            let (next, _) = self
                .inner
                .changed
                .wait_timeout(guard, deadline - now)
                .expect("cancel flag condvar wait failed");
            guard = next;
        }
    }
}

/// Registration returned by [`CancelToken::watch`].
#[must_use = "the watcher is removed when this guard drops"]
pub struct Watch<'a> {
    token: &'a CancelToken,
    id:    u64,
}

impl Drop for Watch<'_> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.token.inner.state.lock() {
            guard.watchers.retain(|(id, _)| *id != self.id);
        }
    }
}

//! Thread-safe FIFO queue with blocking, timed, and non-blocking consumers.
//!
//! Backs the dispatcher's submission queue and every robot's private inbox.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Outcome of [`BlockingQueue::pop_timeout`].
#[derive(Debug, PartialEq, Eq)]
pub enum Popped<T> {
    Item(T),
    TimedOut,
    Closed,
}

/// Closeable multi-producer, multi-consumer FIFO.
pub struct BlockingQueue<T> {
    inner: Mutex<QueueState<T>>,
    available: Condvar,
}

struct QueueState<T> {
    queue: VecDeque<T>,
    closed: bool,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueState {
                queue: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.inner.lock().expect("queue mutex poisoned")
    }

    /// Push an item; returns it back if the queue is closed.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut guard = self.lock();
        if guard.closed {
            return Err(item);
        }
        guard.queue.push_back(item);
        self.available.notify_one();
        Ok(())
    }

    /// Pop the front item if there is one.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().queue.pop_front()
    }

    /// Block until an item is available or the queue is closed.
    ///
    /// Items pushed before `close` are still drained.
    pub fn pop_blocking_or_closed(&self) -> Option<T> {
        let mut guard = self.lock();
        loop {
            if let Some(item) = guard.queue.pop_front() {
                return Some(item);
            }
            if guard.closed {
                return None;
            }
            guard = self.available.wait(guard).expect("condvar wait failed");
        }
    }

    /// Block for at most `timeout` waiting for an item.
    pub fn pop_timeout(&self, timeout: Duration) -> Popped<T> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            if let Some(item) = guard.queue.pop_front() {
                return Popped::Item(item);
            }
            if guard.closed {
                return Popped::Closed;
            }
            let now = Instant::now();
            if now >= deadline {
                return Popped::TimedOut;
            }
            let (next, _) = self
                .available
                .wait_timeout(guard, deadline - now)
                .expect("condvar wait failed");
            guard = next;
        }
    }

    /// Close the queue and wake all blocked consumers.
    pub fn close(&self) {
        let mut guard = self.lock();
        guard.closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Current number of queued items.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }
}

impl<T: Clone> BlockingQueue<T> {
    /// Copy of the queued items in FIFO order.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().queue.iter().cloned().collect()
    }
}

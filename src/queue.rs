//! Thread-safe, unbounded work queue.
//!
//! Producers append with [`WorkQueue::push`] / [`WorkQueue::push_many`]; the worker takes
//! everything at once with [`WorkQueue::drain_all`]. Nothing here blocks on emptiness except
//! [`WorkQueue::wait_for_work`], which the worker uses as its idle sleep.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::utils::lock_recover;

/// Mutex-guarded append-only buffer with atomic drain.
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<Vec<T>>,
    available: Condvar,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            available: Condvar::new(),
        }
    }

    /// Append one item.
    pub fn push(&self, item: T) {
        lock_recover(&self.items, "WorkQueue::push").push(item);
        self.available.notify_one();
    }

    /// Append a sequence in one critical section, keeping its relative order.
    pub fn push_many<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        {
            let mut guard = lock_recover(&self.items, "WorkQueue::push_many");
            let before = guard.len();
            guard.extend(items);
            if guard.len() == before {
                return;
            }
        }
        self.available.notify_one();
    }

    /// Remove and return everything currently queued, or `None` when empty.
    #[must_use]
    pub fn drain_all(&self) -> Option<Vec<T>> {
        let mut guard = lock_recover(&self.items, "WorkQueue::drain_all");
        if guard.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut *guard))
        }
    }

    /// Number of items waiting to be drained.
    #[must_use]
    pub fn len(&self) -> usize {
        lock_recover(&self.items, "WorkQueue::len").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sleep until an item is pushed, [`WorkQueue::wake`] is called, or `timeout` elapses.
    ///
    /// Spurious wake-ups are fine: callers always re-check with [`WorkQueue::drain_all`].
    pub fn wait_for_work(&self, timeout: Duration) {
        let guard = lock_recover(&self.items, "WorkQueue::wait_for_work");
        if !guard.is_empty() {
            return;
        }
        let _ = self.available.wait_timeout(guard, timeout);
    }

    /// Wake any thread parked in [`WorkQueue::wait_for_work`].
    pub fn wake(&self) {
        self.available.notify_all();
    }
}

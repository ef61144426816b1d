//! Blocking key-value rendezvous between producers and consumers.
//!
//! Background jobs publish named results as they finish; request handlers
//! ask for results that may not exist yet and wait, bounded, for them to
//! appear. The store is a plain map behind a lock plus a broadcast wakeup:
//! every write wakes every waiter, and each waiter re-checks for its own
//! key. Entries are never evicted; the process is expected to live for one
//! simulated day.

use std::collections::HashMap;
use std::pin::pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

/// Shared map of named results with blocking-with-timeout reads.
///
/// Construct one instance at startup and hand it to producers and consumers
/// behind an `Arc`; independent instances never observe each other.
///
/// Values are stored by move and handed out as clones, so a published value
/// can never be mutated in place under a concurrent reader.
#[derive(Debug)]
pub struct RendezvousCache<V> {
    entries: Mutex<HashMap<String, V>>,
    wakeup: Notify,
}

impl<V: Clone> Default for RendezvousCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> RendezvousCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            wakeup: Notify::new(),
        }
    }

    /// Publish a value under a key, inserting or overwriting.
    ///
    /// Wakes every task currently blocked in [`get`](Self::get) or
    /// [`wait_for`](Self::wait_for), whatever key it waits for; each one
    /// re-checks its own key. Once `put` returns, every subsequent read
    /// observes the new value.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let mut entries = self.lock();
        entries.insert(key.into(), value);
        drop(entries);
        self.wakeup.notify_waiters();
    }

    /// Non-blocking lookup.
    pub fn try_get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    /// Wait until the key is present, however long that takes.
    ///
    /// Returns immediately when the key is already there. The wakeup future
    /// is registered before each re-check, so a `put` that lands between
    /// the check and the wait still wakes this task; no lost wake-ups.
    pub async fn wait_for(&self, key: &str) -> V {
        let mut pending = pin!(self.wakeup.notified());
        loop {
            pending.as_mut().enable();
            if let Some(value) = self.try_get(key) {
                return value;
            }
            pending.as_mut().await;
            pending.set(self.wakeup.notified());
        }
    }

    /// Lookup with a bounded wait.
    ///
    /// Present keys return immediately. Otherwise the caller suspends until
    /// a write makes the key present or `wait` elapses. `Duration::ZERO`
    /// degenerates to [`try_get`](Self::try_get).
    ///
    /// `None` after the wait means "not produced yet": indistinguishable,
    /// deliberately, from "never will be". Callers retry with a fresh
    /// budget if they want to keep waiting.
    pub async fn get(&self, key: &str, wait: Duration) -> Option<V> {
        if let Some(value) = self.try_get(key) {
            return Some(value);
        }
        if wait.is_zero() {
            return None;
        }
        tokio::time::timeout(wait, self.wait_for(key)).await.ok()
    }

    /// Number of published entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A poisoned lock means a writer panicked between insert and unlock;
    // the map itself is still coherent, so waiting consumers keep going.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

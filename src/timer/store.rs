//! Deadline store shared between a machine and its timer driver.
//!
//! Every operation takes the single lock once and holds it for its whole
//! read-modify-write, so the store can be polled from another thread while
//! the machine's own hooks register and cancel timers.

use super::clock::Clock;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Returned by [`TimerStore::time_until_next`] when nothing is pending.
pub const NO_TIMERS_PENDING: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Debug, PartialEq)]
struct Timer<K> {
    key: K,
    deadline: DateTime<Utc>,
}

/// Ordered collection of `(key, deadline)` pairs, at most one per key.
#[derive(Debug)]
pub struct TimerStore<K> {
    timers: Mutex<Vec<Timer<K>>>,
    clock: Arc<dyn Clock>,
    idle_wait: Duration,
}

impl<K: PartialEq + Clone> TimerStore<K> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_idle_wait(clock, NO_TIMERS_PENDING)
    }

    /// Create a store reporting `idle_wait` from `time_until_next` when empty.
    pub fn with_idle_wait(clock: Arc<dyn Clock>, idle_wait: Duration) -> Self {
        Self {
            timers: Mutex::new(Vec::new()),
            clock,
            idle_wait,
        }
    }

    /// Set `key`'s timer, replacing any existing one.
    ///
    /// Timers sharing a deadline keep insertion order.
    pub fn set_timer(&self, key: K, deadline: DateTime<Utc>) {
        let mut timers = self.timers.lock();
        timers.retain(|t| t.key != key);
        let at = timers.partition_point(|t| t.deadline <= deadline);
        timers.insert(at, Timer { key, deadline });
    }

    /// Remove `key`'s timer. No-op if there is none.
    pub fn clear_timer(&self, key: &K) {
        self.timers.lock().retain(|t| &t.key != key);
    }

    /// Remove and return the earliest timer if its deadline has passed.
    pub fn pop_due(&self) -> Option<K> {
        let mut timers = self.timers.lock();
        let now = self.clock.now();
        let due = timers.first().is_some_and(|t| t.deadline < now);
        if due {
            Some(timers.remove(0).key)
        } else {
            None
        }
    }

    /// Time until the earliest deadline; zero if it has already passed.
    pub fn time_until_next(&self) -> Duration {
        let timers = self.timers.lock();
        match timers.first() {
            Some(first) => (first.deadline - self.clock.now())
                .to_std()
                .unwrap_or(Duration::ZERO),
            None => self.idle_wait,
        }
    }

    /// Earliest armed deadline, due or not.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.lock().first().map(|t| t.deadline)
    }

    pub fn deadline_of(&self, key: &K) -> Option<DateTime<Utc>> {
        self.timers
            .lock()
            .iter()
            .find(|t| &t.key == key)
            .map(|t| t.deadline)
    }

    pub fn len(&self) -> usize {
        self.timers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.lock().is_empty()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

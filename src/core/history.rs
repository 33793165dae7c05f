//! Resting-state transition history.
//!
//! Each processed event that moves the machine from one resting leaf to
//! another is recorded with its trigger and a timestamp. The history is
//! bounded: once full, the oldest record is dropped.

use super::state::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of records kept by [`StateHistory::new`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// Record of a single resting-state change.
///
/// `from` is `None` for the transition performed by
/// [`Machine::start`](crate::Machine::start), which leaves the root.
///
/// # Example
///
/// ```rust
/// use hfsm::core::StateTransition;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: Some("Idle"),
///     to: "Running",
///     trigger: "Go".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.to, "Running");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition<S> {
    /// The leaf the machine rested in before the event
    pub from: Option<S>,
    /// The leaf the machine rests in after the event
    pub to: S,
    /// Label of the event that caused the change
    pub trigger: String,
    /// When the change completed
    pub timestamp: DateTime<Utc>,
}

/// Ordered, bounded history of resting-state changes.
///
/// # Example
///
/// ```rust
/// use hfsm::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::new();
/// history.record(StateTransition {
///     from: None,
///     to: "Start",
///     trigger: "DefaultEntry".to_string(),
///     timestamp: Utc::now(),
/// });
/// history.record(StateTransition {
///     from: Some("Start"),
///     to: "End",
///     trigger: "Finish".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec![&"Start", &"End"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory<S> {
    transitions: VecDeque<StateTransition<S>>,
    capacity: usize,
}

impl<S: StateId> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateId> StateHistory<S> {
    /// Create an empty history holding up to [`DEFAULT_HISTORY_CAPACITY`] records.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history holding up to `capacity` records.
    /// A capacity of zero disables recording.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Append a record, evicting the oldest one when full.
    pub fn record(&mut self, transition: StateTransition<S>) {
        if self.capacity == 0 {
            return;
        }
        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Sequence of resting states covered by the history.
    ///
    /// The first record's `from` is included when present, then every `to`.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(from) = self.transitions.front().and_then(|t| t.from.as_ref()) {
            path.push(from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Elapsed time between the first and last record.
    ///
    /// Returns `None` if there are no records.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.front(), self.transitions.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn transitions(&self) -> &VecDeque<StateTransition<S>> {
        &self.transitions
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}

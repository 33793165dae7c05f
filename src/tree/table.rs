//! Per-state transition tables.

use crate::core::{EventKind, Guard};
use std::collections::HashMap;
use std::hash::Hash;

/// A transition declared on a state.
///
/// The source is implicit: it is the state whose table holds the
/// transition. The target is kept by identity and resolved when the
/// transition first fires, so it may be declared after the source.
#[derive(Clone, Debug)]
pub struct Transition<S> {
    target: S,
    guard: Option<Guard>,
}

impl<S> Transition<S> {
    pub fn new(target: S) -> Self {
        Self {
            target,
            guard: None,
        }
    }

    pub fn guarded(target: S, guard: Guard) -> Self {
        Self {
            target,
            guard: Some(guard),
        }
    }

    pub fn target(&self) -> &S {
        &self.target
    }

    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    /// Check if the transition may fire. An unguarded transition always may.
    pub fn is_enabled(&self) -> bool {
        self.guard.as_ref().is_none_or(|g| g.check())
    }
}

/// Mapping from event identity to candidate transitions, in registration order.
#[derive(Debug)]
pub struct TransitionTable<S, E> {
    entries: HashMap<EventKind<E>, Vec<Transition<S>>>,
}

impl<S, E: Eq + Hash> TransitionTable<S, E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a transition; later registrations for the same event rank lower.
    pub fn add(&mut self, event: EventKind<E>, transition: Transition<S>) {
        self.entries.entry(event).or_default().push(transition);
    }

    /// First transition for `event` whose guard passes.
    ///
    /// Each candidate's guard is evaluated at most once, in registration
    /// order, stopping at the first success.
    pub fn find(&self, event: &EventKind<E>) -> Option<&Transition<S>> {
        self.entries
            .get(event)?
            .iter()
            .find(|transition| transition.is_enabled())
    }

    /// Whether any transition, guarded or not, is declared for `event`.
    pub fn handles(&self, event: &EventKind<E>) -> bool {
        self.entries.contains_key(event)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EventKind<E>, &Transition<S>)> {
        self.entries
            .iter()
            .flat_map(|(event, list)| list.iter().map(move |t| (event, t)))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S, E: Eq + Hash> Default for TransitionTable<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

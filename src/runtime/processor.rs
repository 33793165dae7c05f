//! Event queue and transition selection.
//!
//! Selection walks the ancestor chain from the active leaf to the root and
//! takes the first state whose table matches, so the innermost handler
//! shadows any ancestor's handler for the same event.

use crate::core::{Event, StateId};
use crate::tree::{StateIndex, StateTree, Transition};
use std::collections::VecDeque;
use std::hash::Hash;

/// FIFO of events awaiting processing.
#[derive(Debug)]
pub struct EventQueue<E> {
    events: VecDeque<Event<E>>,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    pub fn push(&mut self, event: Event<E>) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<Event<E>> {
        self.events.pop_front()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the transition `event` triggers while `current` is active.
///
/// Returns the state that owns the transition together with it. An event
/// addressed to a specific state is only offered to that state, and only
/// while it is on the active chain; otherwise it is stale.
pub fn select_transition<'t, S, E>(
    tree: &'t StateTree<S, E>,
    current: StateIndex,
    event: &Event<E>,
) -> Option<(StateIndex, &'t Transition<S>)>
where
    S: StateId,
    E: Eq + Hash,
{
    if let Some(owner) = event.target() {
        if !tree.is_ancestor_or_self(owner, current) {
            return None;
        }
        return tree
            .node(owner)
            .transitions()
            .find(event.kind())
            .map(|t| (owner, t));
    }

    tree.ancestor_chain(current).into_iter().find_map(|node| {
        tree.node(node)
            .transitions()
            .find(event.kind())
            .map(|t| (node, t))
    })
}

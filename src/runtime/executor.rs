//! Transition execution: exit path, entry path, default-entry cascade.
//!
//! A transition from source `S` to target `T` runs inside its domain: the
//! least common ancestor of `S` and `T`, or `T`'s parent when `T` is `S`
//! itself or one of its ancestors (so a self-transition exits and re-enters
//! `T`). States strictly below the domain on the current side are exited,
//! innermost first; states strictly below the domain down to `T` are
//! entered, outermost first. The domain and everything above it is
//! untouched.

use super::context::HookContext;
use super::error::{ConfigError, MachineError};
use super::processor::EventQueue;
use crate::core::{Event, EventId, EventKind, StateId};
use crate::timer::TimerStore;
use crate::tree::{StateIndex, StateTree, Transition};
use std::fmt;

/// Which hook list to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Enter,
    Exit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Enter => f.write_str("enter"),
            Phase::Exit => f.write_str("exit"),
        }
    }
}

/// The node below which a transition from `source` to `target` operates.
pub fn transition_domain<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    source: StateIndex,
    target: StateIndex,
) -> StateIndex {
    let lca = tree.common_ancestor(source, target);
    if lca == target {
        tree.parent(target).unwrap_or(StateIndex::ROOT)
    } else {
        lca
    }
}

/// States to exit, innermost first: `current` up to but excluding `domain`.
pub fn exit_path<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    current: StateIndex,
    domain: StateIndex,
) -> Vec<StateIndex> {
    tree.ancestor_chain(current)
        .into_iter()
        .take_while(|&node| node != domain)
        .collect()
}

/// States to enter, outermost first: below `domain` down to `target`.
pub fn entry_path<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    domain: StateIndex,
    target: StateIndex,
) -> Vec<StateIndex> {
    let mut path: Vec<StateIndex> = tree
        .ancestor_chain(target)
        .into_iter()
        .take_while(|&node| node != domain)
        .collect();
    path.reverse();
    path
}

/// Runs transitions against a tree for the duration of one drain step.
///
/// `current` is updated after every hook list completes, so when a hook
/// fails it still names the deepest state that is actually active.
pub struct Executor<'a, S, E> {
    tree: &'a StateTree<S, E>,
    timers: &'a TimerStore<StateIndex>,
    queue: &'a mut EventQueue<E>,
    max_cascade_depth: usize,
}

impl<'a, S: StateId, E: EventId> Executor<'a, S, E> {
    pub fn new(
        tree: &'a StateTree<S, E>,
        timers: &'a TimerStore<StateIndex>,
        queue: &'a mut EventQueue<E>,
        max_cascade_depth: usize,
    ) -> Self {
        Self {
            tree,
            timers,
            queue,
            max_cascade_depth,
        }
    }

    /// Execute `transition` owned by `source`, then cascade to a leaf.
    pub fn perform(
        &mut self,
        current: &mut StateIndex,
        source: StateIndex,
        transition: &Transition<S>,
        event: &Event<E>,
    ) -> Result<(), MachineError> {
        self.step(current, source, transition, event)?;
        self.cascade(current)
    }

    /// Resolve composite states into leaves via their default entries.
    ///
    /// Only the composite's own table is consulted, never its ancestors.
    pub fn cascade(&mut self, current: &mut StateIndex) -> Result<(), MachineError> {
        let tree = self.tree;
        let entry = Event::default_entry();
        let mut steps = 0;

        while !tree.is_leaf(*current) {
            let state = *current;
            if steps == self.max_cascade_depth {
                return Err(ConfigError::CascadeLimitExceeded {
                    state: tree.name(state).to_string(),
                    limit: self.max_cascade_depth,
                }
                .into());
            }

            let Some(transition) = tree
                .node(state)
                .transitions()
                .find(&EventKind::DefaultEntry)
            else {
                let err = if state == StateIndex::ROOT {
                    ConfigError::NoInitialState
                } else {
                    ConfigError::MissingDefault {
                        state: tree.name(state).to_string(),
                    }
                };
                return Err(err.into());
            };

            self.step(current, state, transition, &entry)?;
            steps += 1;
        }

        Ok(())
    }

    /// Run `node`'s hooks for `phase` with `event`.
    pub fn run_hooks(
        &mut self,
        node: StateIndex,
        phase: Phase,
        event: &Event<E>,
    ) -> Result<(), MachineError> {
        let tree = self.tree;
        let state = tree.node(node);
        let hooks = match phase {
            Phase::Enter => state.enter_hooks(),
            Phase::Exit => state.exit_hooks(),
        };
        if hooks.is_empty() {
            return Ok(());
        }

        tracing::trace!("{} {} ({} hooks)", phase, state.name(), hooks.len());
        let mut ctx = HookContext::new(node, state.id(), self.timers, &mut *self.queue);
        for hook in hooks {
            hook(event, &mut ctx).map_err(|source| MachineError::Hook {
                state: state.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    fn step(
        &mut self,
        current: &mut StateIndex,
        source: StateIndex,
        transition: &Transition<S>,
        event: &Event<E>,
    ) -> Result<(), MachineError> {
        let tree = self.tree;
        let Some(target) = tree.resolve(transition.target()) else {
            let from = tree.name(source).to_string();
            let target = transition.target().name().to_string();
            return Err(ConfigError::TargetNotFound { from, target }.into());
        };
        let domain = transition_domain(tree, source, target);

        tracing::debug!(
            "{} -> {} on {} (from {})",
            tree.name(source),
            tree.name(target),
            event.kind().label(),
            tree.name(*current)
        );

        for node in exit_path(tree, *current, domain) {
            self.run_hooks(node, Phase::Exit, event)?;
            *current = tree.parent(node).unwrap_or(StateIndex::ROOT);
        }
        for node in entry_path(tree, domain, target) {
            self.run_hooks(node, Phase::Enter, event)?;
            *current = node;
        }
        Ok(())
    }
}

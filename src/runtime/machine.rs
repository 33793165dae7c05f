//! The machine: owns the tree, the active state, the queue and the timers.

use super::config::MachineConfig;
use super::error::{ConfigError, MachineError};
use super::executor::{Executor, Phase};
use super::processor::{select_transition, EventQueue};
use crate::builder::MachineBuilder;
use crate::core::{Event, EventId, StateHistory, StateId, StateTransition};
use crate::timer::{deadline_after, Clock, TimerStore};
use crate::tree::{StateIndex, StateTree};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Hierarchical state machine with run-to-completion event processing.
///
/// Every call that processes events takes `&mut self` and returns only once
/// the queue is empty, so posts are atomic with respect to each other and
/// hooks (which never see the machine) cannot post recursively.
///
/// # Example
///
/// ```rust
/// use hfsm::Machine;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut machine = Machine::<&str, &str>::builder()
///     .state("A")?
///     .state("B")?
///     .substate("B", "B1")?
///     .substate("B", "B2")?
///     .initial("A")
///     .default_transition("B", "B1")?
///     .transition("A", "go", "B")?
///     .transition("B1", "go2", "B2")?
///     .build();
///
/// machine.start()?;
/// machine.post_event("go")?;
/// assert_eq!(machine.current_state(), Some(&"B1"));
/// assert!(machine.in_state(&"B"));
///
/// machine.post_event("go2")?;
/// assert_eq!(machine.current_state(), Some(&"B2"));
/// # Ok(())
/// # }
/// ```
pub struct Machine<S: StateId, E: EventId> {
    id: Uuid,
    tree: StateTree<S, E>,
    current: Option<StateIndex>,
    queue: EventQueue<E>,
    timers: Arc<TimerStore<StateIndex>>,
    history: StateHistory<S>,
    config: MachineConfig,
}

impl<S: StateId, E: EventId> Machine<S, E> {
    pub fn builder() -> MachineBuilder<S, E> {
        MachineBuilder::new()
    }

    pub(crate) fn new(tree: StateTree<S, E>, config: MachineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tree,
            current: None,
            queue: EventQueue::new(),
            timers: Arc::new(TimerStore::with_idle_wait(clock, config.idle_wait)),
            history: StateHistory::with_capacity(config.history_capacity),
            config,
        }
    }

    /// Enter the root and cascade through default entries to the first leaf.
    ///
    /// Fails with [`ConfigError::NoInitialState`] if the machine would stay
    /// at the root. After a configuration error the machine is back in its
    /// unstarted state; after a hook error it stays where the hooks left it.
    pub fn start(&mut self) -> Result<(), MachineError> {
        if self.current.is_some() {
            return Err(MachineError::AlreadyStarted);
        }
        let _span = tracing::debug_span!("machine", id = %self.id).entered();
        tracing::info!("starting machine with {} states", self.tree.len() - 1);

        let mut current = StateIndex::ROOT;
        self.current = Some(current);
        let entry = Event::default_entry();
        let result = {
            let mut executor = Executor::new(
                &self.tree,
                &self.timers,
                &mut self.queue,
                self.config.max_cascade_depth,
            );
            executor
                .run_hooks(StateIndex::ROOT, Phase::Enter, &entry)
                .and_then(|()| executor.cascade(&mut current))
        };
        self.current = Some(current);

        let result = result.and_then(|()| {
            if current == StateIndex::ROOT {
                Err(ConfigError::NoInitialState.into())
            } else {
                Ok(())
            }
        });
        if let Err(err) = result {
            // Configuration failures leave the machine unstarted.
            if err.is_configuration() {
                self.current = None;
                self.queue.clear();
            }
            tracing::warn!("start failed: {}", err);
            return Err(err);
        }

        self.record(None, current, &entry);
        tracing::info!("machine started in {}", self.tree.name(current));

        self.drain()
    }

    /// Post a caller event and process until the queue is empty.
    pub fn post_event(&mut self, event: E) -> Result<(), MachineError> {
        self.post(Event::new(event))
    }

    /// Post a caller event carrying a payload.
    pub fn post_event_with<P>(&mut self, event: E, payload: P) -> Result<(), MachineError>
    where
        P: Any + Send + Sync,
    {
        self.post(Event::with_payload(event, payload))
    }

    /// Post the reserved pulse event.
    ///
    /// Timer drivers call this after sleeping for
    /// [`time_until_next_timeout`](Self::time_until_next_timeout) so that a
    /// due timeout gets delivered.
    pub fn pulse(&mut self) -> Result<(), MachineError> {
        self.post(Event::pulse())
    }

    fn post(&mut self, event: Event<E>) -> Result<(), MachineError> {
        if self.current.is_none() {
            return Err(MachineError::NotStarted);
        }
        let _span = tracing::debug_span!("machine", id = %self.id).entered();

        // One timeout per post keeps a burst of expiries from starving callers.
        if let Some(owner) = self.timers.pop_due() {
            tracing::debug!("timeout due for {}", self.tree.name(owner));
            self.queue.push(Event::timeout(owner));
        }
        self.queue.push(event);

        self.drain()
    }

    fn drain(&mut self) -> Result<(), MachineError> {
        let Some(mut current) = self.current else {
            return Err(MachineError::NotStarted);
        };

        while let Some(event) = self.queue.pop() {
            let Some((source, transition)) = select_transition(&self.tree, current, &event) else {
                tracing::trace!(
                    "{} discarded in {}",
                    event.kind().label(),
                    self.tree.name(current)
                );
                continue;
            };

            let from = current;
            let result = Executor::new(
                &self.tree,
                &self.timers,
                &mut self.queue,
                self.config.max_cascade_depth,
            )
            .perform(&mut current, source, transition, &event);
            self.current = Some(current);

            if let Err(err) = result {
                tracing::warn!(
                    "processing {} failed in {}: {}",
                    event.kind().label(),
                    self.tree.name(current),
                    err
                );
                return Err(err);
            }
            if from != current {
                self.record(Some(from), current, &event);
            }
        }

        Ok(())
    }

    fn record(&mut self, from: Option<StateIndex>, to: StateIndex, event: &Event<E>) {
        let Some(to) = self.tree.node(to).id().cloned() else {
            return;
        };
        self.history.record(StateTransition {
            from: from.and_then(|f| self.tree.node(f).id().cloned()),
            to,
            trigger: event.kind().label(),
            timestamp: self.timers.now(),
        });
    }

    /// Whether `state` is the active leaf or one of its ancestors.
    pub fn in_state(&self, state: &S) -> bool {
        match (self.current, self.tree.resolve(state)) {
            (Some(current), Some(node)) => self.tree.is_ancestor_or_self(node, current),
            _ => false,
        }
    }

    /// The active state; `None` before start or while resting at the root.
    pub fn current_state(&self) -> Option<&S> {
        self.current.and_then(|c| self.tree.node(c).id())
    }

    /// Active states from the leaf up to, excluding, the root.
    pub fn active_chain(&self) -> Vec<&S> {
        self.current
            .map(|c| {
                self.tree
                    .ancestor_chain(c)
                    .into_iter()
                    .filter_map(|n| self.tree.node(n).id())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Arm `state`'s timer for `deadline`, replacing any existing one.
    pub fn register_timer(&self, state: &S, deadline: DateTime<Utc>) -> Result<(), MachineError> {
        let node = self.index_of(state)?;
        self.timers.set_timer(node, deadline);
        Ok(())
    }

    /// Arm `state`'s timer to fire `after` from now.
    pub fn register_timeout(&self, state: &S, after: Duration) -> Result<(), MachineError> {
        let deadline = deadline_after(self.timers.now(), after);
        self.register_timer(state, deadline)
    }

    /// Disarm `state`'s timer. No-op if none is armed.
    pub fn cancel_timer(&self, state: &S) -> Result<(), MachineError> {
        let node = self.index_of(state)?;
        self.timers.clear_timer(&node);
        Ok(())
    }

    /// How long a driver may sleep before the machine needs a pulse.
    pub fn time_until_next_timeout(&self) -> Duration {
        self.timers.time_until_next()
    }

    /// Shared handle to the timer store, for a driver on another thread.
    pub fn timers(&self) -> Arc<TimerStore<StateIndex>> {
        Arc::clone(&self.timers)
    }

    pub fn state_index(&self, state: &S) -> Option<StateIndex> {
        self.tree.resolve(state)
    }

    fn index_of(&self, state: &S) -> Result<StateIndex, MachineError> {
        self.tree
            .resolve(state)
            .ok_or_else(|| MachineError::UnknownState {
                state: state.name().to_string(),
            })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_started(&self) -> bool {
        self.current.is_some()
    }

    /// Events left queued, e.g. after a hook failure aborted a drain.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn history(&self) -> &StateHistory<S> {
        &self.history
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn tree(&self) -> &StateTree<S, E> {
        &self.tree
    }
}

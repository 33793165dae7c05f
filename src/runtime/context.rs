//! What an enter or exit hook can see and do.

use super::error::HookError;
use super::processor::EventQueue;
use crate::core::{Event, StateId};
use crate::timer::{deadline_after, TimerStore};
use crate::tree::StateIndex;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::time::Duration;

/// Enter/exit side effect bound to a state.
///
/// Hooks run with the event that caused the transition, in registration
/// order. Returning an error aborts the current processing cycle.
pub type Hook<S, E> =
    Box<dyn Fn(&Event<E>, &mut HookContext<'_, S, E>) -> Result<(), HookError> + Send + Sync>;

/// Handle given to a running hook.
///
/// Hooks cannot reach the machine itself, so they cannot post events
/// recursively. Events raised here are appended to the queue and handled
/// after those already pending in the same drain.
pub struct HookContext<'a, S, E> {
    node: StateIndex,
    state: Option<&'a S>,
    timers: &'a TimerStore<StateIndex>,
    queue: &'a mut EventQueue<E>,
}

impl<'a, S: StateId, E> HookContext<'a, S, E> {
    pub(crate) fn new(
        node: StateIndex,
        state: Option<&'a S>,
        timers: &'a TimerStore<StateIndex>,
        queue: &'a mut EventQueue<E>,
    ) -> Self {
        Self {
            node,
            state,
            timers,
            queue,
        }
    }

    /// State whose hook is running; `None` for the root.
    pub fn state(&self) -> Option<&S> {
        self.state
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.timers.now()
    }

    /// Arm this state's timer to fire `after` from now.
    pub fn set_timeout(&self, after: Duration) {
        self.timers
            .set_timer(self.node, deadline_after(self.timers.now(), after));
    }

    /// Arm this state's timer to fire at `deadline`.
    pub fn set_deadline(&self, deadline: DateTime<Utc>) {
        self.timers.set_timer(self.node, deadline);
    }

    /// Disarm this state's timer, if any.
    pub fn cancel_timeout(&self) {
        self.timers.clear_timer(&self.node);
    }

    /// Queue a follow-up event.
    pub fn raise(&mut self, event: E) {
        self.queue.push(Event::new(event));
    }

    /// Queue a follow-up event carrying a payload.
    pub fn raise_with<P>(&mut self, event: E, payload: P)
    where
        P: Any + Send + Sync,
    {
        self.queue.push(Event::with_payload(event, payload));
    }
}

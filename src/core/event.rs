//! Events posted to a machine.
//!
//! An event is an identity ([`EventKind`]) plus an optional opaque payload.
//! Equality is by identity only. The reserved kinds are produced by the
//! engine itself; callers post [`EventKind::User`] events.

use crate::tree::StateIndex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque payload carried by an event.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Identity of an event, closed over the reserved engine events.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind<E> {
    /// Synthesized when a composite state must pick a child.
    DefaultEntry,
    /// Synthesized when a state's timer expires.
    Timeout,
    /// Posted by [`Machine::pulse`](crate::Machine::pulse) to let due timers fire.
    Pulse,
    /// Caller-defined event.
    User(E),
}

impl<E: fmt::Debug> EventKind<E> {
    /// Returns `true` for the engine's own event kinds.
    pub fn is_reserved(&self) -> bool {
        !matches!(self, EventKind::User(_))
    }

    /// Label used in history records and log lines.
    pub fn label(&self) -> String {
        match self {
            EventKind::DefaultEntry => "DefaultEntry".to_string(),
            EventKind::Timeout => "Timeout".to_string(),
            EventKind::Pulse => "Pulse".to_string(),
            EventKind::User(e) => format!("{e:?}"),
        }
    }
}

/// An event instance flowing through the queue.
///
/// Timeout events are addressed to the state that owns the expired timer;
/// all other events bubble up from the active leaf.
#[derive(Clone)]
pub struct Event<E> {
    kind: EventKind<E>,
    payload: Option<Payload>,
    target: Option<StateIndex>,
}

impl<E> Event<E> {
    /// Create a user event without payload.
    pub fn new(event: E) -> Self {
        Self {
            kind: EventKind::User(event),
            payload: None,
            target: None,
        }
    }

    /// Create a user event carrying a payload.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hfsm::core::Event;
    ///
    /// let event = Event::with_payload("order", 42u32);
    /// assert_eq!(event.payload::<u32>(), Some(&42));
    /// assert!(event.payload::<String>().is_none());
    /// ```
    pub fn with_payload<P>(event: E, payload: P) -> Self
    where
        P: Any + Send + Sync,
    {
        Self {
            kind: EventKind::User(event),
            payload: Some(Arc::new(payload)),
            target: None,
        }
    }

    pub(crate) fn default_entry() -> Self {
        Self::reserved(EventKind::DefaultEntry, None)
    }

    pub(crate) fn timeout(owner: StateIndex) -> Self {
        Self::reserved(EventKind::Timeout, Some(owner))
    }

    pub(crate) fn pulse() -> Self {
        Self::reserved(EventKind::Pulse, None)
    }

    fn reserved(kind: EventKind<E>, target: Option<StateIndex>) -> Self {
        Self {
            kind,
            payload: None,
            target,
        }
    }

    pub fn kind(&self) -> &EventKind<E> {
        &self.kind
    }

    /// The user identity, if this is not a reserved event.
    pub fn user(&self) -> Option<&E> {
        match &self.kind {
            EventKind::User(e) => Some(e),
            _ => None,
        }
    }

    /// Downcast the payload to `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// State this event is addressed to, if any.
    pub fn target(&self) -> Option<StateIndex> {
        self.target
    }
}

impl<E: PartialEq> PartialEq for Event<E> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl<E: fmt::Debug> fmt::Debug for Event<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("payload", &self.payload.is_some())
            .field("target", &self.target)
            .finish()
    }
}

//! Core value types shared by the tree, the timer store and the runtime.
//!
//! - State and event identities via the `StateId` / `EventId` traits
//! - Event instances with reserved engine kinds and opaque payloads
//! - Guard predicates for transition control
//! - Bounded history of resting-state changes

mod event;
mod guard;
mod history;
mod state;

pub use event::{Event, EventKind, Payload};
pub use guard::Guard;
pub use history::{StateHistory, StateTransition, DEFAULT_HISTORY_CAPACITY};
pub use state::{EventId, StateId, StateRef};

pub(crate) use state::ROOT_NAME;

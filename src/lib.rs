//! hfsm: a hierarchical finite state machine runtime.
//!
//! States form a tree. An event is offered to the innermost active state
//! first and bubbles outward through its ancestors until some state declares
//! a transition for it. Transitions run exit hooks from the innermost state
//! up to the transition domain, then entry hooks down to the target, and
//! composite targets keep descending through their default entries until a
//! leaf is active.
//!
//! # Core Concepts
//!
//! - **Tree**: an arena of states addressed by [`tree::StateIndex`]
//! - **Events**: user events plus the reserved default-entry, timeout and
//!   pulse kinds
//! - **Run to completion**: events raised by hooks are queued and processed
//!   after the current transition finishes
//! - **Timers**: per-state deadlines that produce timeout events, judged
//!   against a replaceable [`timer::Clock`]
//!
//! # Example
//!
//! ```rust
//! use hfsm::Machine;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut machine = Machine::<&str, &str>::builder()
//!     .state("Idle")?
//!     .state("Active")?
//!     .substate("Active", "Warming")?
//!     .substate("Active", "Running")?
//!     .initial("Idle")
//!     .default_transition("Active", "Warming")?
//!     .transition("Idle", "start", "Active")?
//!     .transition("Warming", "ready", "Running")?
//!     .transition("Active", "stop", "Idle")?
//!     .build();
//!
//! machine.start()?;
//! machine.post_event("start")?;
//! assert!(machine.in_state(&"Active"));
//! assert!(machine.in_state(&"Warming"));
//!
//! machine.post_event("ready")?;
//! machine.post_event("stop")?;
//! assert_eq!(machine.current_state(), Some(&"Idle"));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod core;
pub mod runtime;
pub mod timer;
pub mod tree;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder};
pub use core::{
    Event, EventId, EventKind, Guard, Payload, StateHistory, StateId, StateRef, StateTransition,
};
pub use runtime::{ConfigError, HookContext, HookError, Machine, MachineConfig, MachineError};
pub use timer::{Clock, ManualClock, SystemClock, TimerStore};

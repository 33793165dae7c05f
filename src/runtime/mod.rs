//! Runtime: run-to-completion processing over a built state tree.
//!
//! - `Machine` owns the tree, the active state, the queue and the timers
//! - `processor` selects the transition an event triggers
//! - `executor` runs exit/enter hooks and default-entry cascades
//! - hooks interact with the machine only through a `HookContext`

mod config;
mod context;
mod error;
mod executor;
mod machine;
mod processor;

pub use config::MachineConfig;
pub use context::{Hook, HookContext};
pub use error::{ConfigError, HookError, MachineError};
pub use executor::{entry_path, exit_path, transition_domain, Phase};
pub use machine::Machine;
pub use processor::{select_transition, EventQueue};

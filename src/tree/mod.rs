//! The state tree and its per-state transition tables.

mod node;
mod table;

pub use node::{StateIndex, StateNode, StateTree};
pub use table::{Transition, TransitionTable};

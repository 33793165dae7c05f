//! Builder API for declaring machines.
//!
//! States are declared top-down, then transitions, hooks and timeouts are
//! attached to them. Transition targets may refer to states declared later.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::MachineBuilder;

//! Build errors for machine declarations.

use crate::runtime::ConfigError;
use thiserror::Error;

/// Errors that can occur when declaring a machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("State '{state}' is already declared. State identities must be unique")]
    DuplicateState { state: String },

    #[error("Unknown state '{state}'. Declare it with .state() or .substate() first")]
    UnknownState { state: String },

    #[error("Machine declaration has {} configuration error(s)", .errors.len())]
    Invalid { errors: Vec<ConfigError> },
}

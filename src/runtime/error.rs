//! Runtime error types.

use thiserror::Error;

/// Fatal configuration problems, raised at the point of first use.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("transition from '{from}' targets unknown state '{target}'")]
    TargetNotFound { from: String, target: String },

    #[error("composite state '{state}' has no default entry")]
    MissingDefault { state: String },

    #[error("no initial state: the root has no default transition into a child")]
    NoInitialState,

    #[error("default-entry cascade from '{state}' exceeded {limit} steps")]
    CascadeLimitExceeded { state: String, limit: usize },
}

/// Failure reported by an enter or exit hook.
///
/// # Example
///
/// ```rust
/// use hfsm::HookError;
///
/// let err = HookError::new("disk full");
/// assert_eq!(err.to_string(), "disk full");
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Errors returned by machine operations.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("hook failed in state '{state}': {source}")]
    Hook {
        state: String,
        #[source]
        source: HookError,
    },

    #[error("machine has not been started")]
    NotStarted,

    #[error("machine is already started")]
    AlreadyStarted,

    #[error("unknown state: {state}")]
    UnknownState { state: String },
}

impl MachineError {
    /// Returns whether this error comes from the machine's declaration
    /// rather than from a hook or misuse of the API.
    pub fn is_configuration(&self) -> bool {
        matches!(self, MachineError::Config(_))
    }

    /// Returns a stable code suitable for logs and metrics labels.
    pub fn error_code(&self) -> &'static str {
        match self {
            MachineError::Config(ConfigError::TargetNotFound { .. }) => "TARGET_NOT_FOUND",
            MachineError::Config(ConfigError::MissingDefault { .. }) => "MISSING_DEFAULT",
            MachineError::Config(ConfigError::NoInitialState) => "NO_INITIAL_STATE",
            MachineError::Config(ConfigError::CascadeLimitExceeded { .. }) => "CASCADE_LIMIT",
            MachineError::Hook { .. } => "HOOK_FAILED",
            MachineError::NotStarted => "NOT_STARTED",
            MachineError::AlreadyStarted => "ALREADY_STARTED",
            MachineError::UnknownState { .. } => "UNKNOWN_STATE",
        }
    }
}

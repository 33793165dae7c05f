//! Machine configuration.

use crate::core::DEFAULT_HISTORY_CAPACITY;
use crate::timer::NO_TIMERS_PENDING;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for a machine.
///
/// Missing fields take their defaults when deserialized, so the struct can
/// be embedded in a host application's configuration file.
///
/// # Example
///
/// ```rust
/// use hfsm::MachineConfig;
/// use std::time::Duration;
///
/// let config = MachineConfig::default()
///     .with_idle_wait(Duration::from_secs(60))
///     .with_history_capacity(0);
/// assert_eq!(config.max_cascade_depth, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Reported by `time_until_next_timeout` when no timer is pending.
    pub idle_wait: Duration,

    /// Longest default-entry cascade accepted before it is treated as a
    /// configuration error.
    pub max_cascade_depth: usize,

    /// Number of history records kept; zero disables history.
    pub history_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            idle_wait: NO_TIMERS_PENDING,
            max_cascade_depth: 64,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl MachineConfig {
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    pub fn with_max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let config = MachineConfig::default();
        assert_eq!(config.idle_wait, NO_TIMERS_PENDING);
        assert_eq!(config.history_capacity, DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: MachineConfig = serde_json::from_str(r#"{"max_cascade_depth": 8}"#).unwrap();
        assert_eq!(config.max_cascade_depth, 8);
        assert_eq!(config.idle_wait, NO_TIMERS_PENDING);
    }
}

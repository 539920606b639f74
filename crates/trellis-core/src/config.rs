use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::commitment::TransitionMode;

/// Retry and backoff parameters for a health supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Attempts made before the last error is returned
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff time unit (milliseconds); the n-th retry waits 2^n units
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,
}

impl SupervisorConfig {
    /// Backoff unit as a duration
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_unit_ms: default_backoff_unit_ms(),
        }
    }
}

/// Root store parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Display name of the root store
    #[serde(default = "default_root_name")]
    pub root_name: String,

    /// Commitment transition mode, inherited by every subsection
    #[serde(default)]
    pub transition_mode: TransitionMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_name: default_root_name(),
            transition_mode: TransitionMode::default(),
        }
    }
}

/// Default value for max attempts
fn default_max_attempts() -> u32 {
    3
}

/// Default value for the backoff unit (milliseconds)
fn default_backoff_unit_ms() -> u64 {
    1000
}

/// Default value for the root store name
fn default_root_name() -> String {
    "root".to_string()
}

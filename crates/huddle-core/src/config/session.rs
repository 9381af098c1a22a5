//! Local session activity configuration.

use serde::{Deserialize, Serialize};

/// Settings for the local activity state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inactivity window after which the session is marked idle, in seconds.
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_seconds: u64,
    /// How often the idle check runs, in seconds.
    #[serde(default = "default_idle_check_interval")]
    pub idle_check_interval_seconds: u64,
    /// Liveness heartbeat interval, in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_threshold_seconds: default_idle_threshold(),
            idle_check_interval_seconds: default_idle_check_interval(),
            heartbeat_interval_seconds: default_heartbeat_interval(),
        }
    }
}

fn default_idle_threshold() -> u64 {
    300
}

fn default_idle_check_interval() -> u64 {
    10
}

fn default_heartbeat_interval() -> u64 {
    30
}

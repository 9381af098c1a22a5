//! Presence store and channel projector configuration.

use serde::{Deserialize, Serialize};

/// Settings for presence reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Interval between projector reconciliation passes, in seconds.
    ///
    /// This also bounds how long a departed user can linger in a
    /// channel's displayed occupant list.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    2
}

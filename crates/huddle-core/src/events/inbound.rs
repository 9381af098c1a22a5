//! Inbound push events carried on the presence channel.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::id::UserId;
use crate::types::presence::{ActivityDetails, PresenceRecord};

/// Events received from the push transport.
///
/// Statuses arrive as plain strings and are normalized by the store;
/// unknown values never fail decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PresenceEvent {
    /// A user came online.
    #[serde(rename = "user-online")]
    UserOnline {
        /// User ID.
        user_id: UserId,
        /// Username.
        username: String,
        /// Initial status string.
        status: String,
    },
    /// A user went offline.
    #[serde(rename = "user-offline")]
    UserOffline {
        /// User ID.
        user_id: UserId,
    },
    /// A user's status or activity changed.
    #[serde(rename = "presence-update")]
    PresenceUpdate {
        /// User ID.
        user_id: UserId,
        /// New status string.
        status: String,
        /// New activity, if any.
        #[serde(default)]
        activity: Option<ActivityDetails>,
    },
    /// Full snapshot of all online users, replacing the local cache.
    /// Sent after reconnect to correct drift.
    #[serde(rename = "online-users-list")]
    BulkSnapshot {
        /// User ID → presence record.
        users: HashMap<UserId, PresenceRecord>,
    },
}

impl PresenceEvent {
    /// Wire tag of this event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserOnline { .. } => "user-online",
            Self::UserOffline { .. } => "user-offline",
            Self::PresenceUpdate { .. } => "presence-update",
            Self::BulkSnapshot { .. } => "online-users-list",
        }
    }

    /// Decode a raw frame.
    ///
    /// Frames missing required keys (most importantly `user_id`) decode
    /// to `None` and are logged. A malformed frame must never become an
    /// error for the transport loop.
    pub fn decode(raw: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value(raw.clone()) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(%err, "dropping malformed presence frame");
                None
            }
        }
    }
}

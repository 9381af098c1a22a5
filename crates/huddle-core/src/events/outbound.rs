//! Outbound frames pushed to the server.

use serde::{Deserialize, Serialize};

use crate::types::presence::{ActivityDetails, PresenceStatus};

/// Frames the client sends upstream over the push channel.
///
/// Delivery is at most once: if the transport is not ready when a frame
/// would be emitted, the frame is dropped. There is no retry queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    /// Liveness heartbeat, no payload.
    #[serde(rename = "heartbeat")]
    Heartbeat,
    /// Request to change this session's broadcast presence.
    #[serde(rename = "presence-update-request")]
    PresenceUpdateRequest {
        /// Requested status.
        status: PresenceStatus,
        /// Requested activity, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        activity: Option<ActivityDetails>,
    },
}

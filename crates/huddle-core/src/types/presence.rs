//! Presence status, activity details, and per-user presence records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ChannelId, UserId};

/// User presence status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    /// User is online and active.
    Online,
    /// User is connected but idle.
    Idle,
    /// Do not disturb.
    Dnd,
    /// User is connected but hidden from others.
    Invisible,
    /// User is not connected.
    Offline,
}

impl PresenceStatus {
    /// Parses from a string with a default fallback.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "online" => Self::Online,
            "idle" => Self::Idle,
            "dnd" | "do_not_disturb" => Self::Dnd,
            "invisible" => Self::Invisible,
            "offline" => Self::Offline,
            _ => Self::Online,
        }
    }

    /// Converts to string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::Dnd => "dnd",
            Self::Invisible => "invisible",
            Self::Offline => "offline",
        }
    }

    /// Whether a user with this status is held in the presence cache.
    ///
    /// Offline and invisible users are removed from the cache rather
    /// than flagged in place.
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Offline | Self::Invisible)
    }
}

/// What a user is currently doing, broadcast alongside their status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDetails {
    /// Activity kind, e.g. [`ActivityDetails::IN_VOICE_CALL`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Voice channel the activity takes place in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    /// Display name of that channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
}

impl ActivityDetails {
    /// Activity kind that marks a user as being in a voice call.
    pub const IN_VOICE_CALL: &'static str = "In Voice Call";

    /// Build a voice-call activity for the given channel.
    pub fn voice_call(channel_id: ChannelId, channel_name: impl Into<String>) -> Self {
        Self {
            kind: Self::IN_VOICE_CALL.to_string(),
            channel_id: Some(channel_id),
            channel_name: Some(channel_name.into()),
        }
    }

    /// Whether this activity places the user in a voice call.
    pub fn is_voice_call(&self) -> bool {
        self.kind == Self::IN_VOICE_CALL
    }
}

/// Cached presence of a single user, keyed uniquely by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// User ID.
    pub user_id: UserId,
    /// Username.
    pub username: String,
    /// Current status.
    pub status: PresenceStatus,
    /// When the user was last seen by this client.
    pub last_seen: DateTime<Utc>,
    /// Current activity, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityDetails>,
}

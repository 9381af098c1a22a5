//! Static friend directory records.
//!
//! Friend data is sourced from the REST directory and joined to presence
//! by `user_id` only at read/render time; the two are never merged into
//! one stored object.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// A friend as returned by the REST directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendRecord {
    /// User ID.
    pub id: UserId,
    /// Username.
    pub username: String,
    /// Avatar URL, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Pending friend requests in both directions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingFriends {
    /// Requests sent to this user.
    #[serde(default)]
    pub incoming: Vec<FriendRecord>,
    /// Requests sent by this user.
    #[serde(default)]
    pub outgoing: Vec<FriendRecord>,
}

/// Profile flags returned by `GET /users/{id}/profile`.
///
/// The payload shape is owned by the directory service; this subsystem
/// only caches and forwards it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The `user` object with its flags.
    #[serde(default)]
    pub user: serde_json::Value,
}

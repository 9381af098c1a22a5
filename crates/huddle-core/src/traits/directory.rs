//! REST directory collaborators, contract only.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::friend::{PendingFriends, UserProfile};
use crate::types::id::UserId;

/// The REST directory endpoints this subsystem consumes.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// `GET /friends/pending`
    async fn pending_friends(&self) -> AppResult<PendingFriends>;

    /// `POST /users/bulk-status` — status strings for a batch of users.
    async fn bulk_status(&self, user_ids: &[UserId]) -> AppResult<HashMap<UserId, String>>;

    /// `GET /users/{id}/profile`
    async fn profile(&self, user_id: &UserId) -> AppResult<UserProfile>;
}

//! Cached directory lookups built on the coalescing cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use huddle_cache::CoalescingCache;
use huddle_core::config::cache::CacheConfig;
use huddle_core::result::AppResult;
use huddle_core::traits::directory::DirectoryClient;
use huddle_core::types::friend::{PendingFriends, UserProfile};
use huddle_core::types::id::UserId;

/// Status string reported for users the directory knows nothing about.
const DEFAULT_STATUS: &str = "offline";

/// Directory lookups with per-entity caching and request coalescing.
///
/// Remote failures degrade to the stale cached value or a default; they
/// never surface to the caller on the cached paths.
pub struct UserDirectory {
    client: Arc<dyn DirectoryClient>,
    statuses: CoalescingCache<UserId, String>,
    profiles: CoalescingCache<UserId, UserProfile>,
}

impl UserDirectory {
    /// Create a directory over the given client and cache settings.
    pub fn new(config: &CacheConfig, client: Arc<dyn DirectoryClient>) -> Self {
        let ttl = Duration::from_secs(config.ttl_seconds);
        Self {
            client,
            statuses: CoalescingCache::new(ttl),
            profiles: CoalescingCache::new(ttl),
        }
    }

    /// Status string for one user, coalesced across concurrent callers.
    pub async fn status(&self, user_id: &UserId) -> String {
        let client = Arc::clone(&self.client);
        let key = user_id.clone();
        self.statuses
            .get_or_default(
                user_id.clone(),
                move || async move {
                    let statuses = client.bulk_status(std::slice::from_ref(&key)).await?;
                    Ok(statuses
                        .get(&key)
                        .cloned()
                        .unwrap_or_else(|| DEFAULT_STATUS.to_string()))
                },
                DEFAULT_STATUS.to_string(),
            )
            .await
    }

    /// Statuses for many users, with one bulk call for the uncached ones.
    pub async fn statuses(&self, user_ids: &[UserId]) -> HashMap<UserId, String> {
        let client = Arc::clone(&self.client);
        self.statuses
            .get_or_fetch_many(user_ids, move |missing| async move {
                client.bulk_status(&missing).await
            })
            .await
    }

    /// Profile flags for one user; an empty profile when the lookup fails
    /// and nothing is cached.
    pub async fn profile(&self, user_id: &UserId) -> UserProfile {
        let client = Arc::clone(&self.client);
        let key = user_id.clone();
        self.profiles
            .get_or_default(
                user_id.clone(),
                move || async move { client.profile(&key).await },
                UserProfile::default(),
            )
            .await
    }

    /// Pending friend requests in both directions, fetched fresh each
    /// call. Errors are surfaced here so the host can offer a retry.
    pub async fn pending_friends(&self) -> AppResult<PendingFriends> {
        self.client.pending_friends().await
    }

    /// Drop a user's cached entries, e.g. after a local mutation.
    pub fn invalidate(&self, user_id: &UserId) {
        self.statuses.invalidate(user_id);
        self.profiles.invalidate(user_id);
    }
}

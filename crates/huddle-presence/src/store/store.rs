//! Canonical cache of per-user presence, fed by the inbound push stream.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};

use huddle_core::events::PresenceEvent;
use huddle_core::types::id::UserId;
use huddle_core::types::presence::{PresenceRecord, PresenceStatus};

use crate::bus::{EventBus, EventCallback, SubscriptionId};

use super::bootstrap::BootstrapSnapshot;

/// Canonical presence cache with synchronous subscriber fan-out.
///
/// Mutated only through [`ingest`](Self::ingest); every mutation is
/// idempotent and key-scoped, so replaying an event leaves the cache in
/// the same state. After every mutation all subscribers run
/// synchronously, in subscription order.
pub struct PresenceStore {
    records: DashMap<UserId, PresenceRecord>,
    bus: EventBus,
    hydrated: AtomicBool,
}

impl PresenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            bus: EventBus::new(),
            hydrated: AtomicBool::new(false),
        }
    }

    /// Apply one inbound event and notify subscribers.
    pub fn ingest(&self, event: PresenceEvent) {
        match &event {
            PresenceEvent::UserOnline {
                user_id,
                username,
                status,
            } => {
                let status = PresenceStatus::from_str_or_default(status);
                if status.is_visible() {
                    self.records.insert(
                        user_id.clone(),
                        PresenceRecord {
                            user_id: user_id.clone(),
                            username: username.clone(),
                            status,
                            last_seen: Utc::now(),
                            activity: None,
                        },
                    );
                } else {
                    self.records.remove(user_id);
                }
            }
            PresenceEvent::UserOffline { user_id } => {
                self.records.remove(user_id);
            }
            PresenceEvent::PresenceUpdate {
                user_id,
                status,
                activity,
            } => {
                let status = PresenceStatus::from_str_or_default(status);
                if !status.is_visible() {
                    self.records.remove(user_id);
                } else {
                    match self.records.entry(user_id.clone()) {
                        Entry::Occupied(mut existing) => {
                            let record = existing.get_mut();
                            record.status = status;
                            record.activity = activity.clone();
                            record.last_seen = Utc::now();
                        }
                        Entry::Vacant(slot) => {
                            // An update can race ahead of the online
                            // event; seed a record and let the next
                            // snapshot fill in the username.
                            slot.insert(PresenceRecord {
                                user_id: user_id.clone(),
                                username: String::new(),
                                status,
                                last_seen: Utc::now(),
                                activity: activity.clone(),
                            });
                        }
                    }
                }
            }
            PresenceEvent::BulkSnapshot { users } => {
                self.records.clear();
                for (user_id, record) in users {
                    if record.status.is_visible() {
                        self.records.insert(user_id.clone(), record.clone());
                    }
                }
            }
        }

        self.bus.publish(&event);
    }

    /// Decode and apply a raw frame from the push channel.
    ///
    /// Malformed frames are dropped and logged, never an error.
    pub fn ingest_frame(&self, raw: &serde_json::Value) {
        if let Some(event) = PresenceEvent::decode(raw) {
            self.ingest(event);
        }
    }

    /// Presence of a single user, if cached.
    pub fn query(&self, user_id: &UserId) -> Option<PresenceRecord> {
        self.records.get(user_id).map(|r| r.value().clone())
    }

    /// All currently visible users.
    pub fn online_users(&self) -> Vec<PresenceRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    /// Number of cached users.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Register a mutation callback. Callbacks run synchronously in
    /// subscription order and must be fast and idempotent.
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        self.bus.subscribe(callback)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Seed the cache from the highest-priority bootstrap source.
    ///
    /// One-shot: the embedded payload is read exactly once at startup,
    /// so repeated hydration is a logged no-op.
    pub fn hydrate(&self, bootstrap: &BootstrapSnapshot) {
        if self.hydrated.swap(true, Ordering::SeqCst) {
            warn!("presence store already hydrated, ignoring");
            return;
        }

        let records = bootstrap.resolve();
        debug!(count = records.len(), "hydrating presence store");
        let users = records
            .into_iter()
            .map(|record| (record.user_id.clone(), record))
            .collect();
        self.ingest(PresenceEvent::BulkSnapshot { users });
    }
}

impl Default for PresenceStore {
    fn default() -> Self {
        Self::new()
    }
}

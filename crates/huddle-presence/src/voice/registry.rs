//! Cross-producer registry of voice-channel occupants.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use huddle_core::types::id::{ChannelId, ProducerTag, UserId};

/// One occupant of a voice channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceOccupant {
    /// User ID.
    pub user_id: UserId,
    /// Username at registration time.
    pub username: String,
    /// Display name of the channel.
    pub channel_name: String,
    /// When this occupant was first sighted in the channel.
    pub joined_at: DateTime<Utc>,
    /// Which producer registered this occupant.
    pub producer: ProducerTag,
}

/// Registry preventing the same `(channel, user)` occupancy pair from
/// being inserted twice by independently initialized producers.
///
/// The conflict rule is first-writer-wins: the earliest registrant for a
/// pair owns the record until it explicitly releases it, so a second
/// subsystem observing the same occupant cannot produce a duplicate row.
/// A channel's entry set is removed entirely once empty; no empty
/// residual containers persist.
pub struct ParticipantRegistry {
    channels: DashMap<ChannelId, HashMap<UserId, VoiceOccupant>>,
}

impl ParticipantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Register an occupant.
    ///
    /// Returns `false` — leaving the existing record and its original
    /// producer untouched — if the `(channel, user)` pair is already
    /// present.
    pub fn register(&self, channel_id: &ChannelId, occupant: VoiceOccupant) -> bool {
        let mut occupants = self.channels.entry(channel_id.clone()).or_default();
        if occupants.contains_key(&occupant.user_id) {
            return false;
        }
        occupants.insert(occupant.user_id.clone(), occupant);
        true
    }

    /// Release an occupant owned by `producer`.
    ///
    /// Returns whether a record was removed. The channel's entry set is
    /// garbage-collected once it becomes empty.
    pub fn release(&self, channel_id: &ChannelId, user_id: &UserId, producer: &ProducerTag) -> bool {
        let removed = match self.channels.get_mut(channel_id) {
            Some(mut occupants) => match occupants.get(user_id) {
                Some(existing) if existing.producer == *producer => {
                    occupants.remove(user_id);
                    true
                }
                _ => false,
            },
            None => false,
        };
        if removed {
            self.gc(channel_id);
        }
        removed
    }

    /// Occupants of a channel, ordered by join time.
    pub fn list(&self, channel_id: &ChannelId) -> Vec<VoiceOccupant> {
        let mut occupants: Vec<VoiceOccupant> = self
            .channels
            .get(channel_id)
            .map(|entry| entry.values().cloned().collect())
            .unwrap_or_default();
        occupants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        occupants
    }

    /// Whether the pair is registered.
    pub fn has(&self, channel_id: &ChannelId, user_id: &UserId) -> bool {
        self.channels
            .get(channel_id)
            .is_some_and(|occupants| occupants.contains_key(user_id))
    }

    /// Remove a channel's entire occupant set.
    pub fn clear(&self, channel_id: &ChannelId) {
        self.channels.remove(channel_id);
    }

    /// Release every entry owned by `producer` (component teardown).
    pub fn release_producer(&self, producer: &ProducerTag) {
        let mut emptied = Vec::new();
        for mut entry in self.channels.iter_mut() {
            entry
                .value_mut()
                .retain(|_, occupant| occupant.producer != *producer);
            if entry.value().is_empty() {
                emptied.push(entry.key().clone());
            }
        }
        for channel_id in emptied {
            self.gc(&channel_id);
        }
    }

    /// Number of channels with at least one occupant.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn gc(&self, channel_id: &ChannelId) {
        self.channels
            .remove_if(channel_id, |_, occupants| occupants.is_empty());
    }
}

impl Default for ParticipantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Derives each channel's displayed occupant list by reconciling push
//! deltas against periodic snapshots of the presence store.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::trace;

use huddle_core::events::PresenceEvent;
use huddle_core::types::id::{ChannelId, ProducerTag, UserId};

use crate::store::PresenceStore;

use super::registry::{ParticipantRegistry, VoiceOccupant};

/// Callback handed the per-channel occupant lists after every pass.
///
/// Channels cleared during the pass appear with an empty list so the
/// renderer can drop their rows. The projector performs no rendering
/// itself.
pub type RenderCallback = Box<dyn Fn(&HashMap<ChannelId, Vec<VoiceOccupant>>) + Send + Sync>;

/// Projects "who is in which voice channel" out of presence data.
///
/// Two independent inputs feed the projection: push deltas (a user is
/// registered the moment a voice-call activity is observed) and a
/// periodic full pass over the store's online users. Departure is only
/// ever inferred from absence in a reconciliation pass, so removal lags
/// by up to one poll interval.
pub struct ChannelProjector {
    store: Arc<PresenceStore>,
    registry: Arc<ParticipantRegistry>,
    render: RenderCallback,
    /// Channels this projector currently displays.
    tracked: Mutex<HashSet<ChannelId>>,
    producer: ProducerTag,
}

impl ChannelProjector {
    /// Producer tag under which this projector registers occupants.
    pub const PRODUCER: &'static str = "channel-projector";

    /// Create a projector over the given store and registry.
    pub fn new(
        store: Arc<PresenceStore>,
        registry: Arc<ParticipantRegistry>,
        render: RenderCallback,
    ) -> Self {
        Self {
            store,
            registry,
            render,
            tracked: Mutex::new(HashSet::new()),
            producer: ProducerTag::from(Self::PRODUCER),
        }
    }

    /// The tag this projector's registrations carry.
    pub fn producer(&self) -> &ProducerTag {
        &self.producer
    }

    /// Push delta: register a user the moment their activity says they
    /// are in a voice call. Everything else is left to reconciliation.
    pub fn handle_event(&self, event: &PresenceEvent) {
        let PresenceEvent::PresenceUpdate {
            user_id,
            activity: Some(activity),
            ..
        } = event
        else {
            return;
        };
        if !activity.is_voice_call() {
            return;
        }
        let Some(channel_id) = activity.channel_id.clone() else {
            return;
        };

        let username = self
            .store
            .query(user_id)
            .map(|record| record.username)
            .unwrap_or_default();
        self.register_occupant(
            &channel_id,
            user_id.clone(),
            username,
            activity.channel_name.clone(),
        );
        self.lock_tracked().insert(channel_id);
    }

    /// One reconciliation pass over the store's online users.
    ///
    /// Every user in a voice call is upserted into their channel's
    /// occupant set. Occupants this projector registered that were not
    /// observed in the pass are released, and every tracked channel
    /// absent entirely from the pass is cleared, so a departure is
    /// reflected after at most one pass whether or not others remain in
    /// the channel. Occupants registered by other producers are left
    /// untouched. The rendering callback is invoked with the result.
    pub fn reconcile(&self) {
        let mut observed: HashMap<ChannelId, HashSet<UserId>> = HashMap::new();
        for record in self.store.online_users() {
            let Some(activity) = record.activity.as_ref().filter(|a| a.is_voice_call()) else {
                continue;
            };
            let Some(channel_id) = activity.channel_id.clone() else {
                continue;
            };
            // First sighting sets joined_at; an existing registration
            // keeps its original record (first-writer-wins).
            self.register_occupant(
                &channel_id,
                record.user_id.clone(),
                record.username.clone(),
                activity.channel_name.clone(),
            );
            observed
                .entry(channel_id)
                .or_default()
                .insert(record.user_id.clone());
        }

        let stale: Vec<ChannelId> = {
            let tracked = self.lock_tracked();
            tracked
                .iter()
                .filter(|channel_id| !observed.contains_key(*channel_id))
                .cloned()
                .collect()
        };
        for channel_id in &stale {
            trace!(channel = %channel_id, "clearing channel absent from reconciliation pass");
            self.registry.clear(channel_id);
        }

        // Departures within a still-occupied channel: drop our own
        // registrations that this pass did not confirm.
        for (channel_id, users) in &observed {
            for occupant in self.registry.list(channel_id) {
                if occupant.producer == self.producer && !users.contains(&occupant.user_id) {
                    trace!(
                        channel = %channel_id,
                        user = %occupant.user_id,
                        "releasing occupant absent from reconciliation pass"
                    );
                    self.registry
                        .release(channel_id, &occupant.user_id, &self.producer);
                }
            }
        }

        *self.lock_tracked() = observed.keys().cloned().collect();

        let mut view: HashMap<ChannelId, Vec<VoiceOccupant>> = observed
            .keys()
            .map(|channel_id| (channel_id.clone(), self.registry.list(channel_id)))
            .collect();
        for channel_id in stale {
            view.insert(channel_id, Vec::new());
        }

        (self.render)(&view);
    }

    /// Forget all tracked channels (component teardown).
    pub fn reset(&self) {
        self.lock_tracked().clear();
    }

    fn register_occupant(
        &self,
        channel_id: &ChannelId,
        user_id: UserId,
        username: String,
        channel_name: Option<String>,
    ) -> bool {
        self.registry.register(
            channel_id,
            VoiceOccupant {
                user_id,
                username,
                channel_name: channel_name.unwrap_or_default(),
                joined_at: Utc::now(),
                producer: self.producer.clone(),
            },
        )
    }

    fn lock_tracked(&self) -> MutexGuard<'_, HashSet<ChannelId>> {
        self.tracked.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use huddle_core::types::presence::ActivityDetails;

    type ViewLog = Arc<Mutex<Vec<HashMap<ChannelId, Vec<VoiceOccupant>>>>>;

    fn make_projector() -> (Arc<PresenceStore>, Arc<ParticipantRegistry>, ChannelProjector, ViewLog) {
        let store = Arc::new(PresenceStore::new());
        let registry = Arc::new(ParticipantRegistry::new());
        let views: ViewLog = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&views);
        let projector = ChannelProjector::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            Box::new(move |view| {
                sink.lock().expect("lock").push(view.clone());
            }),
        );
        (store, registry, projector, views)
    }

    fn voice_update(user: &str, channel: &str) -> PresenceEvent {
        PresenceEvent::PresenceUpdate {
            user_id: user.into(),
            status: "online".to_string(),
            activity: Some(ActivityDetails::voice_call(channel.into(), "General")),
        }
    }

    #[test]
    fn test_reconcile_registers_voice_users() {
        let (store, registry, projector, views) = make_projector();
        store.ingest(voice_update("a", "5"));

        projector.reconcile();

        let listed = registry.list(&"5".into());
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_id, UserId::from("a"));

        let last = views.lock().expect("lock").last().cloned().expect("view");
        assert_eq!(last[&ChannelId::from("5")].len(), 1);
    }

    #[test]
    fn test_absent_user_clears_channel_after_one_pass() {
        let (store, registry, projector, views) = make_projector();
        store.ingest(voice_update("a", "5"));
        projector.reconcile();
        assert!(registry.has(&"5".into(), &"a".into()));

        // Next snapshot omits the user entirely.
        store.ingest(PresenceEvent::UserOffline { user_id: "a".into() });
        projector.reconcile();

        assert!(registry.list(&"5".into()).is_empty());
        assert_eq!(registry.channel_count(), 0);

        // The renderer saw the emptied channel so it can drop the row.
        let last = views.lock().expect("lock").last().cloned().expect("view");
        assert!(last[&ChannelId::from("5")].is_empty());
    }

    #[test]
    fn test_departed_user_released_while_channel_stays_occupied() {
        let (store, registry, projector, views) = make_projector();
        store.ingest(voice_update("a", "5"));
        store.ingest(voice_update("b", "5"));
        projector.reconcile();
        assert_eq!(registry.list(&"5".into()).len(), 2);

        // The next snapshot omits `a` but still has `b` in the channel.
        store.ingest(PresenceEvent::UserOffline { user_id: "a".into() });
        projector.reconcile();

        let listed = registry.list(&"5".into());
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_id, UserId::from("b"));

        let last = views.lock().expect("lock").last().cloned().expect("view");
        assert_eq!(last[&ChannelId::from("5")].len(), 1);
        assert_eq!(last[&ChannelId::from("5")][0].user_id, UserId::from("b"));
    }

    #[test]
    fn test_reconcile_leaves_foreign_registrations_alone() {
        let (store, registry, projector, _views) = make_projector();
        registry.register(
            &"5".into(),
            VoiceOccupant {
                user_id: "x".into(),
                username: "x".to_string(),
                channel_name: "General".to_string(),
                joined_at: Utc::now(),
                producer: "other-subsystem".into(),
            },
        );

        // `x` is not in the store's snapshot, but it is not ours to drop.
        store.ingest(voice_update("b", "5"));
        projector.reconcile();

        assert!(registry.has(&"5".into(), &"x".into()));
        assert!(registry.has(&"5".into(), &"b".into()));
    }

    #[test]
    fn test_reconcile_preserves_original_joined_at() {
        let (store, registry, projector, _views) = make_projector();
        store.ingest(voice_update("a", "5"));

        projector.reconcile();
        let first = registry.list(&"5".into())[0].joined_at;

        projector.reconcile();
        let second = registry.list(&"5".into())[0].joined_at;
        assert_eq!(first, second);
    }

    #[test]
    fn test_push_delta_registers_immediately() {
        let (store, registry, projector, _views) = make_projector();
        let event = voice_update("a", "5");
        store.ingest(event.clone());

        projector.handle_event(&event);
        assert!(registry.has(&"5".into(), &"a".into()));
    }

    #[test]
    fn test_non_voice_events_are_ignored() {
        let (_store, registry, projector, _views) = make_projector();

        projector.handle_event(&PresenceEvent::PresenceUpdate {
            user_id: "a".into(),
            status: "online".to_string(),
            activity: Some(ActivityDetails {
                kind: "playing chess".to_string(),
                channel_id: None,
                channel_name: None,
            }),
        });
        projector.handle_event(&PresenceEvent::UserOffline { user_id: "a".into() });

        assert_eq!(registry.channel_count(), 0);
    }

    #[test]
    fn test_users_moving_between_channels() {
        let (store, registry, projector, _views) = make_projector();
        store.ingest(voice_update("a", "5"));
        projector.reconcile();

        // The user hops to another channel; the old one empties out.
        store.ingest(voice_update("a", "6"));
        projector.reconcile();

        assert!(registry.list(&"5".into()).is_empty());
        assert_eq!(registry.list(&"6".into()).len(), 1);
    }
}

//! Typed synchronous event bus for presence fan-out.
//!
//! Subscribers run synchronously, in subscription order, on the thread
//! that performed the mutation. There is no batching or coalescing of
//! notifications, so callbacks must be fast and idempotent. The
//! subscriber list is snapshotted per publish, so a callback may
//! subscribe or unsubscribe from inside a notification; changes take
//! effect from the next publish.

use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use huddle_core::events::PresenceEvent;

/// Identifies one subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Callback invoked for every store mutation.
pub type EventCallback = Box<dyn Fn(&PresenceEvent) + Send + Sync>;

type SharedCallback = Arc<dyn Fn(&PresenceEvent) + Send + Sync>;

/// Ordered fan-out of presence events to registered callbacks.
pub struct EventBus {
    subscribers: Mutex<Vec<(SubscriptionId, SharedCallback)>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback. Callbacks run in subscription order.
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.lock().push((id, Arc::from(callback)));
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Invoke every subscriber with the event, in subscription order.
    ///
    /// The list is snapshotted first so the lock is not held while
    /// callbacks run; a callback may therefore call back into the bus.
    pub fn publish(&self, event: &PresenceEvent) {
        let snapshot: Vec<SharedCallback> = self
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, SharedCallback)>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

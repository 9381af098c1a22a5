//! # huddle-presence
//!
//! Presence engine for the Huddle chat client. Provides:
//!
//! - Canonical per-user presence cache with synchronous subscriber fan-out
//! - Local session activity machine with idle detection and heartbeat
//! - De-duplicating cross-producer registry for voice-channel occupancy
//! - Channel occupant projection reconciling push deltas against polls
//! - Cached REST directory lookups with request coalescing
//!
//! The host application supplies the push transport, the directory HTTP
//! endpoint, and a rendering callback; everything else is owned by
//! [`PresenceEngine`].

pub mod bus;
pub mod directory;
pub mod engine;
pub mod session;
pub mod store;
pub mod transport;
pub mod voice;

pub use bus::SubscriptionId;
pub use engine::PresenceEngine;
pub use session::activity::SessionActivity;
pub use store::PresenceStore;
pub use transport::gate::TransportGate;
pub use voice::projector::ChannelProjector;
pub use voice::registry::ParticipantRegistry;

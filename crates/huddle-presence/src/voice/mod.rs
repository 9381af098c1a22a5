//! Voice-channel occupancy: registry and projection.

pub mod projector;
pub mod registry;

pub use projector::ChannelProjector;
pub use registry::{ParticipantRegistry, VoiceOccupant};

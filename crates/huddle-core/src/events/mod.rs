//! Wire event definitions for the multiplexed push channel.

pub mod inbound;
pub mod outbound;

pub use inbound::PresenceEvent;
pub use outbound::OutboundFrame;

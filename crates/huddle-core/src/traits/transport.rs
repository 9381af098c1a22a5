//! Seam to the push transport owned by the host application.

use async_trait::async_trait;

use crate::events::outbound::OutboundFrame;

/// Outbound half of the persistent push channel.
///
/// Delivery is at most once. Callers drop frames while the transport is
/// not ready, and `send` reports failure instead of queueing.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Whether the transport is currently connected and writable.
    fn is_ready(&self) -> bool;

    /// Send one frame. Returns `false` if the frame could not be handed
    /// to the transport.
    async fn send(&self, frame: OutboundFrame) -> bool;
}

//! One-shot readiness gate for the push transport.
//!
//! Interested tasks await [`TransportGate::ready`], which resolves
//! exactly once when the host marks the transport ready, and is
//! cancelled by simply dropping the future. This replaces repeated
//! poll-until-ready timer loops.

use tokio::sync::watch;

/// Latched readiness signal for the push transport.
pub struct TransportGate {
    tx: watch::Sender<bool>,
}

impl TransportGate {
    /// Create a gate in the not-ready state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Signal that the transport can accept frames. Idempotent: the
    /// outcome is latched, later calls change nothing.
    pub fn mark_ready(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether the transport has been marked ready.
    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the transport is ready. Resolves immediately if it
    /// already is.
    pub async fn ready(&self) {
        let mut rx = self.tx.subscribe();
        // The outcome is latched, so a mark_ready between subscribe and
        // wait_for is still observed.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for TransportGate {
    fn default() -> Self {
        Self::new()
    }
}

//! Local session activity: online/idle transitions and liveness heartbeat.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use huddle_core::config::session::SessionConfig;
use huddle_core::events::OutboundFrame;
use huddle_core::traits::transport::PushTransport;
use huddle_core::types::presence::{ActivityDetails, PresenceStatus};

/// The two local activity states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalState {
    /// The user has interacted recently.
    Active,
    /// The inactivity window elapsed with no input.
    Idle,
}

#[derive(Debug)]
struct ActivityState {
    state: LocalState,
    last_input_at: Instant,
    activity: Option<ActivityDetails>,
}

/// Tracks the session's own draft presence and pushes changes upstream.
///
/// Two unrelated triggers emit frames: state transitions send a
/// `presence-update-request`, and the heartbeat interval sends a bare
/// `heartbeat`. If the transport is not ready when a frame would be
/// emitted, the frame is dropped — no retry queue, no buffering.
pub struct SessionActivity {
    state: Mutex<ActivityState>,
    transport: Arc<dyn PushTransport>,
    idle_threshold: Duration,
}

impl SessionActivity {
    /// Create the machine in the `Active` state.
    pub fn new(config: &SessionConfig, transport: Arc<dyn PushTransport>) -> Self {
        Self {
            state: Mutex::new(ActivityState {
                state: LocalState::Active,
                last_input_at: Instant::now(),
                activity: None,
            }),
            transport,
            idle_threshold: Duration::from_secs(config.idle_threshold_seconds),
        }
    }

    /// Current local state.
    pub fn state(&self) -> LocalState {
        self.lock().state
    }

    /// The session's advertised activity, if any.
    pub fn current_activity(&self) -> Option<ActivityDetails> {
        self.lock().activity.clone()
    }

    /// Record an input or focus signal. Wakes the session immediately if
    /// it was idle.
    pub async fn record_input(&self) {
        let woke = {
            let mut state = self.lock();
            state.last_input_at = Instant::now();
            if state.state == LocalState::Idle {
                state.state = LocalState::Active;
                true
            } else {
                false
            }
        };
        if woke {
            debug!("session woke from idle");
            self.emit_status(PresenceStatus::Online).await;
        }
    }

    /// Idle-timer tick: transition to idle once the inactivity window has
    /// elapsed.
    ///
    /// The transition is suppressed entirely while the session's activity
    /// is a voice call — a user on a call must never be auto-marked idle.
    /// Only an explicit activity change away from the call re-enables the
    /// timer's effect.
    pub async fn check_idle(&self) {
        let became_idle = {
            let mut state = self.lock();
            let in_voice_call = state
                .activity
                .as_ref()
                .is_some_and(ActivityDetails::is_voice_call);
            if state.state == LocalState::Active
                && !in_voice_call
                && state.last_input_at.elapsed() >= self.idle_threshold
            {
                state.state = LocalState::Idle;
                true
            } else {
                false
            }
        };
        if became_idle {
            debug!("session went idle");
            self.emit_status(PresenceStatus::Idle).await;
        }
    }

    /// Replace the session's advertised activity and push the change.
    pub async fn set_activity(&self, activity: Option<ActivityDetails>) {
        let status = {
            let mut state = self.lock();
            state.activity = activity;
            match state.state {
                LocalState::Active => PresenceStatus::Online,
                LocalState::Idle => PresenceStatus::Idle,
            }
        };
        self.emit_status(status).await;
    }

    /// Liveness heartbeat.
    ///
    /// Deliberately a separate path from status emission: it fires on its
    /// own interval whether or not anything changed.
    pub async fn heartbeat(&self) {
        self.emit(OutboundFrame::Heartbeat).await;
    }

    /// Reset to the initial state (component teardown).
    pub fn reset(&self) {
        let mut state = self.lock();
        state.state = LocalState::Active;
        state.last_input_at = Instant::now();
        state.activity = None;
    }

    async fn emit_status(&self, status: PresenceStatus) {
        let activity = self.current_activity();
        self.emit(OutboundFrame::PresenceUpdateRequest { status, activity })
            .await;
    }

    async fn emit(&self, frame: OutboundFrame) {
        if !self.transport.is_ready() {
            trace!("transport not ready, dropping outbound frame");
            return;
        }
        if !self.transport.send(frame).await {
            debug!("transport rejected outbound frame");
        }
    }

    fn lock(&self) -> MutexGuard<'_, ActivityState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    struct RecordingTransport {
        ready: AtomicBool,
        frames: Mutex<Vec<OutboundFrame>>,
    }

    impl RecordingTransport {
        fn new(ready: bool) -> Self {
            Self {
                ready: AtomicBool::new(ready),
                frames: Mutex::new(Vec::new()),
            }
        }

        fn frames(&self) -> Vec<OutboundFrame> {
            self.frames.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl PushTransport for RecordingTransport {
        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        async fn send(&self, frame: OutboundFrame) -> bool {
            self.frames.lock().expect("lock").push(frame);
            true
        }
    }

    fn make_session(transport: Arc<RecordingTransport>) -> SessionActivity {
        SessionActivity::new(&SessionConfig::default(), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_after_inactivity_window() {
        let transport = Arc::new(RecordingTransport::new(true));
        let session = make_session(Arc::clone(&transport));

        tokio::time::advance(Duration::from_secs(301)).await;
        session.check_idle().await;

        assert_eq!(session.state(), LocalState::Idle);
        assert_eq!(
            transport.frames(),
            vec![OutboundFrame::PresenceUpdateRequest {
                status: PresenceStatus::Idle,
                activity: None,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_call_suppresses_idle_transition() {
        let transport = Arc::new(RecordingTransport::new(true));
        let session = make_session(Arc::clone(&transport));

        session
            .set_activity(Some(ActivityDetails::voice_call("5".into(), "General")))
            .await;

        tokio::time::advance(Duration::from_secs(3600)).await;
        session.check_idle().await;
        assert_eq!(session.state(), LocalState::Active);

        // Leaving the call re-enables the timer's effect for the same
        // elapsed time.
        session
            .set_activity(Some(ActivityDetails {
                kind: "idle".to_string(),
                channel_id: None,
                channel_name: None,
            }))
            .await;
        session.check_idle().await;
        assert_eq!(session.state(), LocalState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_wakes_idle_session() {
        let transport = Arc::new(RecordingTransport::new(true));
        let session = make_session(Arc::clone(&transport));

        tokio::time::advance(Duration::from_secs(301)).await;
        session.check_idle().await;
        assert_eq!(session.state(), LocalState::Idle);

        session.record_input().await;
        assert_eq!(session.state(), LocalState::Active);

        let frames = transport.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[1],
            OutboundFrame::PresenceUpdateRequest {
                status: PresenceStatus::Online,
                activity: None,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_input_while_active_emits_nothing() {
        let transport = Arc::new(RecordingTransport::new(true));
        let session = make_session(Arc::clone(&transport));

        session.record_input().await;
        session.record_input().await;
        assert!(transport.frames().is_empty());

        // Input keeps pushing the idle deadline out.
        tokio::time::advance(Duration::from_secs(200)).await;
        session.record_input().await;
        tokio::time::advance(Duration::from_secs(200)).await;
        session.check_idle().await;
        assert_eq!(session.state(), LocalState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_dropped_when_transport_not_ready() {
        let transport = Arc::new(RecordingTransport::new(false));
        let session = make_session(Arc::clone(&transport));

        session.heartbeat().await;
        tokio::time::advance(Duration::from_secs(301)).await;
        session.check_idle().await;

        // State still transitioned, but nothing was sent.
        assert_eq!(session.state(), LocalState::Idle);
        assert!(transport.frames().is_empty());
    }

    #[tokio::test]
    async fn test_heartbeat_is_a_separate_path() {
        let transport = Arc::new(RecordingTransport::new(true));
        let session = make_session(Arc::clone(&transport));

        session.heartbeat().await;
        session.heartbeat().await;

        assert_eq!(
            transport.frames(),
            vec![OutboundFrame::Heartbeat, OutboundFrame::Heartbeat]
        );
    }
}

//! Shared test helpers for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use huddle_core::config::AppConfig;
use huddle_core::error::AppError;
use huddle_core::events::OutboundFrame;
use huddle_core::result::AppResult;
use huddle_core::traits::directory::DirectoryClient;
use huddle_core::traits::transport::PushTransport;
use huddle_core::types::friend::{PendingFriends, UserProfile};
use huddle_core::types::id::{ChannelId, UserId};

use huddle_presence::PresenceEngine;
use huddle_presence::voice::registry::VoiceOccupant;

/// Transport double that records every frame it accepts.
pub struct RecordingTransport {
    ready: AtomicBool,
    frames: Mutex<Vec<OutboundFrame>>,
}

impl RecordingTransport {
    pub fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
            frames: Mutex::new(Vec::new()),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn frames(&self) -> Vec<OutboundFrame> {
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

/// Directory double that counts calls and can be flipped into failure.
#[derive(Default)]
pub struct FakeDirectory {
    pub bulk_calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn pending_friends(&self) -> AppResult<PendingFriends> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_service("directory down"));
        }
        Ok(PendingFriends::default())
    }

    async fn bulk_status(&self, user_ids: &[UserId]) -> AppResult<HashMap<UserId, String>> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_service("directory down"));
        }
        Ok(user_ids
            .iter()
            .map(|id| (id.clone(), "online".to_string()))
            .collect())
    }

    async fn profile(&self, _user_id: &UserId) -> AppResult<UserProfile> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_service("directory down"));
        }
        Ok(UserProfile::default())
    }
}

/// Every view the projector rendered, in order.
pub type ViewLog = Arc<Mutex<Vec<HashMap<ChannelId, Vec<VoiceOccupant>>>>>;

/// Fully wired engine over recording doubles.
pub struct TestEngine {
    pub engine: PresenceEngine,
    pub transport: Arc<RecordingTransport>,
    pub directory: Arc<FakeDirectory>,
    pub views: ViewLog,
}

impl TestEngine {
    pub fn new() -> Self {
        let transport = Arc::new(RecordingTransport::new(true));
        let directory = Arc::new(FakeDirectory::default());
        let views: ViewLog = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&views);
        let engine = PresenceEngine::new(
            AppConfig::default(),
            Arc::clone(&transport) as Arc<dyn PushTransport>,
            Arc::clone(&directory) as Arc<dyn DirectoryClient>,
            Box::new(move |view| {
                sink.lock().expect("lock").push(view.clone());
            }),
        );

        Self {
            engine,
            transport,
            directory,
            views,
        }
    }
}

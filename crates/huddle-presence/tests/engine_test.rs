//! Integration tests for the engine lifecycle and its interval tasks.

mod helpers;

use std::time::Duration;

use chrono::Utc;

use huddle_core::events::{OutboundFrame, PresenceEvent};
use huddle_core::types::id::ChannelId;
use huddle_core::types::presence::{ActivityDetails, PresenceRecord, PresenceStatus};

use helpers::TestEngine;
use huddle_presence::store::BootstrapSnapshot;

fn voice_update(user: &str, channel: &str) -> PresenceEvent {
    PresenceEvent::PresenceUpdate {
        user_id: user.into(),
        status: "online".to_string(),
        activity: Some(ActivityDetails::voice_call(channel.into(), "General")),
    }
}

#[tokio::test]
async fn test_start_twice_without_shutdown_is_refused() {
    let app = TestEngine::new();

    app.engine
        .start(&BootstrapSnapshot::default())
        .expect("first start");
    assert!(app.engine.is_running());

    let err = app
        .engine
        .start(&BootstrapSnapshot::default())
        .expect_err("second start must fail");
    assert_eq!(err.kind, huddle_core::error::ErrorKind::Conflict);

    // The refused start must not have torn anything down.
    assert!(app.engine.is_running());
    app.engine.shutdown();
}

#[tokio::test]
async fn test_start_after_shutdown_succeeds() {
    let app = TestEngine::new();

    app.engine
        .start(&BootstrapSnapshot::default())
        .expect("first start");
    app.engine.shutdown();
    assert!(!app.engine.is_running());

    app.engine
        .start(&BootstrapSnapshot::default())
        .expect("restart after shutdown");
    app.engine.shutdown();
}

#[tokio::test]
async fn test_bootstrap_snapshot_seeds_the_store() {
    let app = TestEngine::new();
    let bootstrap = BootstrapSnapshot {
        provided: Some(vec![
            PresenceRecord {
                user_id: "u1".into(),
                username: "alice".to_string(),
                status: PresenceStatus::Online,
                last_seen: Utc::now(),
                activity: None,
            },
            PresenceRecord {
                user_id: "u2".into(),
                username: "bob".to_string(),
                status: PresenceStatus::Offline,
                last_seen: Utc::now(),
                activity: None,
            },
        ]),
        embedded_json: None,
    };

    app.engine.start(&bootstrap).expect("start");

    // Only visible users survive hydration.
    assert_eq!(app.engine.store.len(), 1);
    assert!(app.engine.store.query(&"u1".into()).is_some());
    app.engine.shutdown();
}

#[tokio::test]
async fn test_push_delta_registers_voice_occupant_immediately() {
    let app = TestEngine::new();
    app.engine
        .start(&BootstrapSnapshot::default())
        .expect("start");

    app.engine.store.ingest(voice_update("u1", "5"));

    // The store subscription fans out synchronously, no poll needed.
    assert!(app.engine.registry.has(&"5".into(), &"u1".into()));
    app.engine.shutdown();
}

#[tokio::test]
async fn test_shutdown_releases_projector_occupants() {
    let app = TestEngine::new();
    app.engine
        .start(&BootstrapSnapshot::default())
        .expect("start");

    app.engine.store.ingest(voice_update("u1", "5"));
    assert_eq!(app.engine.registry.channel_count(), 1);

    app.engine.shutdown();
    assert_eq!(app.engine.registry.channel_count(), 0);

    // Idempotent.
    app.engine.shutdown();
    assert!(!app.engine.is_running());
}

#[tokio::test]
async fn test_shutdown_stops_store_fan_out_to_projector() {
    let app = TestEngine::new();
    app.engine
        .start(&BootstrapSnapshot::default())
        .expect("start");
    app.engine.shutdown();

    // Events after teardown no longer reach the projector.
    app.engine.store.ingest(voice_update("u1", "5"));
    assert_eq!(app.engine.registry.channel_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_starts_only_after_gate_opens() {
    let app = TestEngine::new();
    app.engine
        .start(&BootstrapSnapshot::default())
        .expect("start");

    app.engine.gate.mark_ready();
    tokio::time::sleep(Duration::from_secs(95)).await;

    let heartbeats = app
        .transport
        .frames()
        .iter()
        .filter(|f| matches!(f, OutboundFrame::Heartbeat))
        .count();
    // Immediate tick plus three 30s intervals.
    assert!(heartbeats >= 3, "expected >= 3 heartbeats, got {heartbeats}");
    app.engine.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_session_goes_idle_under_the_engine_timer() {
    let app = TestEngine::new();
    app.engine
        .start(&BootstrapSnapshot::default())
        .expect("start");

    tokio::time::sleep(Duration::from_secs(400)).await;

    assert!(app.transport.frames().contains(
        &OutboundFrame::PresenceUpdateRequest {
            status: PresenceStatus::Idle,
            activity: None,
        }
    ));
    app.engine.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_poll_reconciliation_renders_occupant_views() {
    let app = TestEngine::new();
    app.engine
        .start(&BootstrapSnapshot::default())
        .expect("start");

    app.engine.store.ingest(voice_update("u1", "5"));
    tokio::time::sleep(Duration::from_secs(5)).await;

    let views = app.views.lock().expect("lock");
    let last = views.last().expect("at least one reconciliation pass");
    assert_eq!(last[&ChannelId::from("5")].len(), 1);
    drop(views);
    app.engine.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_departed_user_disappears_within_one_poll() {
    let app = TestEngine::new();
    app.engine
        .start(&BootstrapSnapshot::default())
        .expect("start");

    app.engine.store.ingest(voice_update("u1", "5"));
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(app.engine.registry.has(&"5".into(), &"u1".into()));

    app.engine
        .store
        .ingest(PresenceEvent::UserOffline { user_id: "u1".into() });
    // One pass is enough to clear the channel; the cleared channel shows
    // up exactly once in the rendered view, as an empty list.
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(app.engine.registry.channel_count(), 0);
    let views = app.views.lock().expect("lock");
    let last = views.last().expect("view");
    assert!(last[&ChannelId::from("5")].is_empty());
    drop(views);
    app.engine.shutdown();
}

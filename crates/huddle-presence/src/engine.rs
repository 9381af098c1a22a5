//! Root engine owning and wiring all presence components.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use huddle_core::config::AppConfig;
use huddle_core::error::AppError;
use huddle_core::result::AppResult;
use huddle_core::traits::directory::DirectoryClient;
use huddle_core::traits::transport::PushTransport;

use crate::bus::SubscriptionId;
use crate::directory::lookup::UserDirectory;
use crate::session::activity::SessionActivity;
use crate::store::bootstrap::BootstrapSnapshot;
use crate::store::store::PresenceStore;
use crate::transport::gate::TransportGate;
use crate::voice::projector::{ChannelProjector, RenderCallback};
use crate::voice::registry::ParticipantRegistry;

/// Central object owning the presence store, session activity machine,
/// participant registry, channel projector, and directory lookups.
///
/// Construction wires the components together; [`start`](Self::start)
/// hydrates the store and spawns the interval tasks;
/// [`shutdown`](Self::shutdown) is idempotent and mandatory before a
/// rebuild. Repeated starts without teardown are refused — that is the
/// principal resource-leak risk.
pub struct PresenceEngine {
    /// Canonical presence cache.
    pub store: Arc<PresenceStore>,
    /// Local session activity machine.
    pub session: Arc<SessionActivity>,
    /// Cross-producer voice occupancy registry.
    pub registry: Arc<ParticipantRegistry>,
    /// Channel occupant projector.
    pub projector: Arc<ChannelProjector>,
    /// Cached REST directory lookups.
    pub directory: Arc<UserDirectory>,
    /// Push transport readiness gate.
    pub gate: Arc<TransportGate>,
    config: AppConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    projector_subscription: Mutex<Option<SubscriptionId>>,
    running: AtomicBool,
}

impl PresenceEngine {
    /// Build and wire all components. Nothing runs until
    /// [`start`](Self::start).
    pub fn new(
        config: AppConfig,
        transport: Arc<dyn PushTransport>,
        directory_client: Arc<dyn DirectoryClient>,
        render: RenderCallback,
    ) -> Self {
        let store = Arc::new(PresenceStore::new());
        let registry = Arc::new(ParticipantRegistry::new());
        let projector = Arc::new(ChannelProjector::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            render,
        ));
        let session = Arc::new(SessionActivity::new(&config.session, transport));
        let directory = Arc::new(UserDirectory::new(&config.cache, directory_client));
        let gate = Arc::new(TransportGate::new());

        info!("presence engine initialized");

        Self {
            store,
            session,
            registry,
            projector,
            directory,
            gate,
            config,
            tasks: Mutex::new(Vec::new()),
            projector_subscription: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    /// Whether the engine's interval tasks are running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Hydrate the store and spawn the interval tasks.
    ///
    /// Fails with a conflict if the engine is already running; call
    /// [`shutdown`](Self::shutdown) first to re-initialize.
    pub fn start(&self, bootstrap: &BootstrapSnapshot) -> AppResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(AppError::conflict("presence engine already running"));
        }

        // Subscribe before hydrating so the projector observes the
        // initial snapshot. The weak reference keeps the subscription
        // from pinning the projector alive through the store.
        let projector = Arc::downgrade(&self.projector);
        let id = self.store.subscribe(Box::new(move |event| {
            if let Some(projector) = projector.upgrade() {
                projector.handle_event(event);
            }
        }));
        *self.lock_subscription() = Some(id);

        self.store.hydrate(bootstrap);

        let mut tasks = self.lock_tasks();

        // Heartbeat starts once the transport gate resolves.
        let session = Arc::clone(&self.session);
        let gate = Arc::clone(&self.gate);
        let heartbeat_interval =
            Duration::from_secs(self.config.session.heartbeat_interval_seconds);
        tasks.push(tokio::spawn(async move {
            gate.ready().await;
            let mut ticker = tokio::time::interval(heartbeat_interval);
            loop {
                ticker.tick().await;
                session.heartbeat().await;
            }
        }));

        // Idle check: an unrelated trigger from the heartbeat, on its
        // own cadence.
        let session = Arc::clone(&self.session);
        let idle_interval = Duration::from_secs(self.config.session.idle_check_interval_seconds);
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(idle_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                session.check_idle().await;
            }
        }));

        // Poll reconciliation.
        let projector = Arc::clone(&self.projector);
        let poll_interval = Duration::from_secs(self.config.presence.poll_interval_seconds);
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                projector.reconcile();
            }
        }));

        info!("presence engine started");
        Ok(())
    }

    /// Tear down all intervals, drop the store subscription, and release
    /// the registry entries owned by this engine's projector.
    ///
    /// Idempotent: calling it on a stopped engine is a no-op.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        for task in self.lock_tasks().drain(..) {
            task.abort();
        }
        if let Some(id) = self.lock_subscription().take() {
            self.store.unsubscribe(id);
        }
        self.registry.release_producer(self.projector.producer());
        self.projector.reset();
        self.session.reset();

        info!("presence engine shut down");
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_subscription(&self) -> std::sync::MutexGuard<'_, Option<SubscriptionId>> {
        self.projector_subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for PresenceEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

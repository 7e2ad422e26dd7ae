//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    clock::{Clock, Millis},
    dashboard::{Dashboard, DashboardSnapshot},
    intent::Intent,
    persistence::RemoteSync,
    state::render_elapsed,
    tasks::replication_task,
    view::{DashboardView, SlotKey},
};

/// The most recent intent that changed something
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastAction {
    pub action: &'static str,
    pub at: DateTime<Utc>,
}

/// Shared state for the server: one dashboard, mutated one intent at a time
pub struct AppState {
    /// The dashboard tree; the lock serializes every mutation
    pub dashboard: Arc<Mutex<Dashboard>>,
    pub clock: Arc<dyn Clock>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    last_action: Mutex<Option<LastAction>>,
    /// Channel for snapshot updates to the presentation layer
    pub snapshot_tx: watch::Sender<DashboardSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    pub _snapshot_rx: watch::Receiver<DashboardSnapshot>,
}

impl AppState {
    /// Wrap `dashboard` and start replicating its commits to `remote`.
    /// Must be called inside a tokio runtime.
    pub fn new(
        port: u16,
        host: String,
        mut dashboard: Dashboard,
        clock: Arc<dyn Clock>,
        remote: Arc<dyn RemoteSync>,
    ) -> Arc<Self> {
        let commits = dashboard.subscribe_commits();
        let initial = dashboard.snapshot(clock.now());
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let state = Arc::new(Self {
            dashboard: Arc::new(Mutex::new(dashboard)),
            clock,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
        });

        tokio::spawn(replication_task(Arc::downgrade(&state), remote, commits));
        state
    }

    fn lock_dashboard(&self) -> Result<MutexGuard<'_, Dashboard>, String> {
        self.dashboard
            .lock()
            .map_err(|e| format!("Failed to lock dashboard: {}", e))
    }

    /// Route an intent to its owner and publish the new snapshot. An
    /// `after-ack` submit returns once its commit has been settled; dropping
    /// the returned future early leaves the settlement to the replication
    /// task.
    pub async fn dispatch(&self, intent: Intent) -> Result<DashboardView, String> {
        let action = intent.kind();
        let mut snapshots = self.subscribe();

        let outcome = {
            let mut dashboard = self.lock_dashboard()?;
            let outcome = dashboard.dispatch(intent);
            if outcome.changed {
                self.publish(dashboard.snapshot(self.clock.now()));
            }
            outcome
        };

        if outcome.changed {
            self.record_action(action);
        }

        if let Some(slot) = outcome.awaiting_ack {
            while self.awaiting_ack(&slot)? {
                if snapshots.changed().await.is_err() {
                    break;
                }
            }
        }

        self.get_view()
    }

    /// Whether `slot` holds a submitted form that the remote has not answered yet
    pub fn awaiting_ack(&self, slot: &SlotKey) -> Result<bool, String> {
        Ok(self.lock_dashboard()?.awaiting_ack(slot))
    }

    /// Report the remote outcome for store commit `sequence`
    pub fn settle(&self, sequence: u64, outcome: Result<(), String>) -> Result<Option<SlotKey>, String> {
        let mut dashboard = self.lock_dashboard()?;
        let failed = outcome.as_ref().err().cloned();
        let settled = dashboard.settle(sequence, outcome);
        if let Some(slot) = &settled {
            match failed {
                Some(e) => warn!("Replication failed, re-opening {}: {}", slot, e),
                None => info!("Remote acknowledged {}", slot),
            }
            self.publish(dashboard.snapshot(self.clock.now()));
        }
        Ok(settled)
    }

    /// Republish the current snapshot with a fresh `now` so running timers
    /// redraw. Nothing is mutated.
    pub fn tick(&self) -> Result<(), String> {
        let dashboard = self.lock_dashboard()?;
        self.publish(dashboard.snapshot(self.clock.now()));
        Ok(())
    }

    fn publish(&self, snapshot: DashboardSnapshot) {
        if let Err(e) = self.snapshot_tx.send(snapshot) {
            warn!("Failed to publish snapshot: {}", e);
        }
    }

    fn record_action(&self, action: &'static str) {
        match self.last_action.lock() {
            Ok(mut last) => {
                *last = Some(LastAction {
                    action,
                    at: Utc::now(),
                })
            }
            Err(e) => warn!("Failed to record {}: {}", action, e),
        }
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Get the current snapshot
    pub fn get_snapshot(&self) -> Result<DashboardSnapshot, String> {
        let dashboard = self.lock_dashboard()?;
        Ok(dashboard.snapshot(self.clock.now()))
    }

    /// Get the composed view at the current instant
    pub fn get_view(&self) -> Result<DashboardView, String> {
        let dashboard = self.lock_dashboard()?;
        Ok(dashboard.view(self.clock.now()))
    }

    /// Server uptime in the same `HH:MM:SS` form the timers use
    pub fn uptime(&self) -> String {
        render_elapsed(self.start_time.elapsed().as_millis() as Millis)
    }

    pub fn last_action(&self) -> Option<LastAction> {
        self.last_action.lock().ok().and_then(|last| last.clone())
    }

    /// Log the starting board
    pub fn log_summary(&self) -> Result<(), String> {
        let snapshot = self.get_snapshot()?;
        let running = snapshot.timers.iter().filter(|t| t.is_running()).count();
        info!("Dashboard holds {} timers ({} running)", snapshot.timers.len(), running);
        Ok(())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("dashboard", &self.dashboard)
            .field("port", &self.port)
            .field("host", &self.host)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use futures::future::{self, BoxFuture};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::{
        clock::ManualClock,
        ids::SequentialIds,
        persistence::NoopSync,
        state::{ClosePolicy, StoreEvent, TimerId},
        view::ItemView,
    };

    struct FailingSync;

    impl RemoteSync for FailingSync {
        fn replicate(&self, _event: StoreEvent) -> BoxFuture<'static, anyhow::Result<()>> {
            Box::pin(future::ready(Err(anyhow::anyhow!("remote unavailable"))))
        }
    }

    /// Holds every replication until a permit is released
    struct GatedSync {
        gate: Arc<Semaphore>,
    }

    impl RemoteSync for GatedSync {
        fn replicate(&self, _event: StoreEvent) -> BoxFuture<'static, anyhow::Result<()>> {
            let gate = Arc::clone(&self.gate);
            Box::pin(async move {
                gate.acquire_owned().await?.forget();
                Ok(())
            })
        }
    }

    fn app(policy: ClosePolicy, remote: Arc<dyn RemoteSync>) -> (Arc<AppState>, ManualClock) {
        let clock = ManualClock::new(1_000);
        let dashboard = Dashboard::new(Arc::new(clock.clone()), Arc::new(SequentialIds::new()), policy);
        let state = AppState::new(0, "127.0.0.1".into(), dashboard, Arc::new(clock.clone()), remote);
        (state, clock)
    }

    fn create_intent(title: &str) -> Intent {
        Intent::Create {
            title: title.into(),
            project: String::new(),
        }
    }

    async fn fill_create_form(state: &AppState, title: &str) {
        state.dispatch(Intent::OpenForm { slot: SlotKey::Create }).await.unwrap();
        state
            .dispatch(Intent::SetTitle {
                slot: SlotKey::Create,
                value: title.into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dispatch_publishes_snapshot() {
        let (state, _) = app(ClosePolicy::Immediate, Arc::new(NoopSync));
        let mut rx = state.subscribe();

        state.dispatch(create_intent("Mow the lawn")).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.timers[0].title, "Mow the lawn");
        assert_eq!(state.last_action().map(|last| last.action), Some("create"));
    }

    #[tokio::test]
    async fn noop_dispatch_publishes_nothing() {
        let (state, _) = app(ClosePolicy::Immediate, Arc::new(NoopSync));
        let mut rx = state.subscribe();
        rx.borrow_and_update();

        state
            .dispatch(Intent::Stop {
                id: TimerId::new("ghost"),
            })
            .await
            .unwrap();

        assert!(!rx.has_changed().unwrap());
        assert_eq!(state.last_action(), None);
    }

    #[tokio::test]
    async fn tick_republishes_with_fresh_now() {
        let (state, clock) = app(ClosePolicy::Immediate, Arc::new(NoopSync));
        state.dispatch(create_intent("a")).await.unwrap();
        let mut rx = state.subscribe();
        rx.borrow_and_update();

        clock.advance(1_000);
        state.tick().unwrap();

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.now, 2_000);
        assert_eq!(snapshot.revision, 1);
    }

    #[tokio::test]
    async fn uptime_uses_clock_format() {
        let (state, _) = app(ClosePolicy::Immediate, Arc::new(NoopSync));
        assert_eq!(state.uptime(), "00:00:00");
    }

    #[tokio::test]
    async fn immediate_policy_closes_even_when_remote_fails() {
        let (state, _) = app(ClosePolicy::Immediate, Arc::new(FailingSync));
        fill_create_form(&state, "Bake squash").await;

        let view = state.dispatch(Intent::SubmitForm { slot: SlotKey::Create }).await.unwrap();

        assert_eq!(view.timers.len(), 1);
        assert!(!state.get_snapshot().unwrap().is_open(&SlotKey::Create));
    }

    #[tokio::test]
    async fn after_ack_policy_reopens_on_remote_failure() {
        let (state, _) = app(ClosePolicy::AfterAck, Arc::new(FailingSync));
        state.dispatch(create_intent("Mow the lawn")).await.unwrap();
        let id = state.get_snapshot().unwrap().timers[0].id.clone();
        let slot = SlotKey::Edit(id);

        state.dispatch(Intent::OpenForm { slot: slot.clone() }).await.unwrap();
        let view = state.dispatch(Intent::SubmitForm { slot: slot.clone() }).await.unwrap();

        assert!(state.get_snapshot().unwrap().is_open(&slot));
        match &view.timers[0] {
            ItemView::Form(form) => assert_eq!(form.error.as_deref(), Some("remote unavailable")),
            other => panic!("expected form, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn after_ack_policy_closes_on_success() {
        let (state, _) = app(ClosePolicy::AfterAck, Arc::new(NoopSync));
        state.dispatch(Intent::OpenForm { slot: SlotKey::Create }).await.unwrap();
        state.dispatch(Intent::SubmitForm { slot: SlotKey::Create }).await.unwrap();

        let snapshot = state.get_snapshot().unwrap();
        assert_eq!(snapshot.timers.len(), 1);
        assert!(!snapshot.is_open(&SlotKey::Create));
    }

    #[tokio::test]
    async fn after_ack_settles_when_request_is_dropped() {
        let gate = Arc::new(Semaphore::new(0));
        let (state, _) = app(
            ClosePolicy::AfterAck,
            Arc::new(GatedSync {
                gate: Arc::clone(&gate),
            }),
        );
        fill_create_form(&state, "Walk the dog").await;

        let submit = state.dispatch(Intent::SubmitForm { slot: SlotKey::Create });
        assert!(tokio::time::timeout(Duration::from_millis(50), submit).await.is_err());
        assert!(state.awaiting_ack(&SlotKey::Create).unwrap());

        gate.add_permits(1);
        for _ in 0..200 {
            if !state.awaiting_ack(&SlotKey::Create).unwrap() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let snapshot = state.get_snapshot().unwrap();
        assert!(!snapshot.is_open(&SlotKey::Create));
        assert_eq!(snapshot.timers.len(), 1);

        // The slot is usable again
        fill_create_form(&state, "Feed the cat").await;
        gate.add_permits(1);
        state.dispatch(Intent::SubmitForm { slot: SlotKey::Create }).await.unwrap();

        let snapshot = state.get_snapshot().unwrap();
        assert!(!snapshot.is_open(&SlotKey::Create));
        assert_eq!(snapshot.timers.len(), 2);
    }
}

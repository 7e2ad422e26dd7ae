//! Replication background task

use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    persistence::RemoteSync,
    state::{AppState, StoreEvent},
};

/// Drain the store's commit stream into `remote`, one event at a time, and
/// settle any `after-ack` form waiting on each commit. Ends when the store
/// (and with it the sender side) is dropped.
pub async fn replication_task(
    state: Weak<AppState>,
    remote: Arc<dyn RemoteSync>,
    mut commits: mpsc::UnboundedReceiver<StoreEvent>,
) {
    info!("Starting replication task");

    while let Some(event) = commits.recv().await {
        let sequence = event.sequence;
        let kind = event.mutation.kind();
        let id = event.mutation.timer_id().clone();

        let outcome = remote.replicate(event).await.map_err(|e| format!("{:#}", e));
        match &outcome {
            Ok(()) => debug!("Replicated #{} {} for timer {}", sequence, kind, id),
            Err(e) => warn!("Failed to replicate #{} {} for timer {}: {}", sequence, kind, id, e),
        }

        let Some(state) = state.upgrade() else {
            break;
        };
        if let Err(e) = state.settle(sequence, outcome) {
            warn!("Failed to settle commit #{}: {}", sequence, e);
        }
    }

    info!("Replication task stopped");
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    use super::*;
    use crate::{
        clock::ManualClock,
        dashboard::Dashboard,
        ids::SequentialIds,
        intent::Intent,
        state::ClosePolicy,
    };

    /// Records sequence numbers; the first event is slowed down so a racing
    /// replicator would let later events overtake it.
    #[derive(Default)]
    struct RecordingSync {
        seen: Arc<Mutex<Vec<u64>>>,
    }

    impl RemoteSync for RecordingSync {
        fn replicate(&self, event: StoreEvent) -> BoxFuture<'static, anyhow::Result<()>> {
            let seen = Arc::clone(&self.seen);
            Box::pin(async move {
                if event.sequence == 1 {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                }
                seen.lock().unwrap().push(event.sequence);
                Ok(())
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn replicates_in_commit_order() {
        let clock = ManualClock::new(0);
        let dashboard = Dashboard::new(
            Arc::new(clock.clone()),
            Arc::new(SequentialIds::new()),
            ClosePolicy::Immediate,
        );
        let remote = RecordingSync::default();
        let seen = Arc::clone(&remote.seen);
        let state = AppState::new(0, "127.0.0.1".into(), dashboard, Arc::new(clock.clone()), Arc::new(remote));

        state
            .dispatch(Intent::Create {
                title: "a".into(),
                project: String::new(),
            })
            .await
            .unwrap();
        let id = state.get_snapshot().unwrap().timers[0].id.clone();
        state.dispatch(Intent::Start { id: id.clone() }).await.unwrap();
        clock.advance(10);
        state.dispatch(Intent::Stop { id: id.clone() }).await.unwrap();
        state.dispatch(Intent::Delete { id }).await.unwrap();

        for _ in 0..200 {
            if seen.lock().unwrap().len() == 4 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn stops_when_state_is_dropped() {
        let clock = ManualClock::new(0);
        let mut dashboard = Dashboard::new(
            Arc::new(clock.clone()),
            Arc::new(SequentialIds::new()),
            ClosePolicy::Immediate,
        );
        let commits = dashboard.subscribe_commits();
        drop(dashboard);

        let handle = tokio::spawn(replication_task(
            Weak::new(),
            Arc::new(crate::persistence::NoopSync),
            commits,
        ));
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("task should end once the store is gone")
            .unwrap();
    }
}

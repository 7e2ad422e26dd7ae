//! Timer list store - the only owner of the timer collection

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{TimerDraft, TimerId, TimerRecord};
use crate::{clock::{Clock, Millis}, ids::IdGenerator};

/// A committed change to the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    Create { timer: TimerRecord },
    Update { id: TimerId, title: String, project: String },
    Delete { id: TimerId },
    Start { id: TimerId, start: Millis },
    Stop { id: TimerId, stop: Millis },
}

impl Mutation {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "create",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
            Mutation::Start { .. } => "start",
            Mutation::Stop { .. } => "stop",
        }
    }

    pub fn timer_id(&self) -> &TimerId {
        match self {
            Mutation::Create { timer } => &timer.id,
            Mutation::Update { id, .. }
            | Mutation::Delete { id }
            | Mutation::Start { id, .. }
            | Mutation::Stop { id, .. } => id,
        }
    }
}

/// Notification sent to subscribers after each commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    /// Commit number, starting at 1; subscribers see them in this order
    pub sequence: u64,
    pub mutation: Mutation,
}

/// Sole owner of the ordered timer collection
pub struct TimerStore {
    timers: Vec<TimerRecord>,
    sequence: u64,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    subscribers: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

impl TimerStore {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            timers: Vec::new(),
            sequence: 0,
            clock,
            ids,
            subscribers: Vec::new(),
        }
    }

    /// Load pre-existing records, e.g. demo data. Records whose id is already
    /// present are skipped.
    pub fn with_timers(mut self, timers: impl IntoIterator<Item = TimerRecord>) -> Self {
        for timer in timers {
            if self.position(&timer.id).is_some() {
                warn!("Skipping duplicate seed timer {}", timer.id);
                continue;
            }
            self.timers.push(timer);
        }
        self
    }

    /// Subscribe to commit notifications. Every commit after this call is
    /// delivered, in commit order; nothing is dropped for slow readers.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Number of the last commit
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Append a new, stopped timer
    pub fn create(&mut self, draft: TimerDraft) -> TimerRecord {
        let timer = TimerRecord::new(self.ids.next_id(), draft);
        info!("Creating timer {} ({:?} / {:?})", timer.id, timer.title, timer.project);

        self.timers.push(timer.clone());
        self.commit(Mutation::Create { timer: timer.clone() });
        timer
    }

    /// Replace title and project. Timing fields are left alone.
    pub fn update(&mut self, id: &TimerId, draft: TimerDraft) -> Option<Mutation> {
        let Some(timer) = self.find_mut(id, "update") else {
            return None;
        };

        timer.title = draft.title;
        timer.project = draft.project;
        info!("Updated timer {}", id);

        let mutation = Mutation::Update {
            id: id.clone(),
            title: timer.title.clone(),
            project: timer.project.clone(),
        };
        self.commit(mutation.clone());
        Some(mutation)
    }

    pub fn delete(&mut self, id: &TimerId) -> Option<Mutation> {
        let Some(index) = self.position(id) else {
            warn!("Ignoring delete for unknown timer {}", id);
            return None;
        };

        self.timers.remove(index);
        info!("Deleted timer {}", id);

        let mutation = Mutation::Delete { id: id.clone() };
        self.commit(mutation.clone());
        Some(mutation)
    }

    pub fn start(&mut self, id: &TimerId) -> Option<Mutation> {
        let now = self.clock.now();
        let timer = self.find_mut(id, "start")?;

        if timer.is_running() {
            debug!("Timer {} already running", id);
            return None;
        }

        timer.running_since = Some(now);
        info!("Started timer {} at {}", id, now);

        let mutation = Mutation::Start { id: id.clone(), start: now };
        self.commit(mutation.clone());
        Some(mutation)
    }

    pub fn stop(&mut self, id: &TimerId) -> Option<Mutation> {
        let now = self.clock.now();
        let timer = self.find_mut(id, "stop")?;

        let Some(since) = timer.running_since.take() else {
            debug!("Timer {} already stopped", id);
            return None;
        };

        timer.elapsed_base += now.saturating_sub(since);
        info!("Stopped timer {} at {}, elapsed {}ms", id, now, timer.elapsed_base);

        let mutation = Mutation::Stop { id: id.clone(), stop: now };
        self.commit(mutation.clone());
        Some(mutation)
    }

    pub fn get(&self, id: &TimerId) -> Option<&TimerRecord> {
        self.timers.iter().find(|t| &t.id == id)
    }

    /// Copy of the collection in display order
    pub fn snapshot(&self) -> Vec<TimerRecord> {
        self.timers.clone()
    }

    fn position(&self, id: &TimerId) -> Option<usize> {
        self.timers.iter().position(|t| &t.id == id)
    }

    fn find_mut(&mut self, id: &TimerId, op: &str) -> Option<&mut TimerRecord> {
        let found = self.timers.iter_mut().find(|t| &t.id == id);
        if found.is_none() {
            warn!("Ignoring {} for unknown timer {}", op, id);
        }
        found
    }

    fn commit(&mut self, mutation: Mutation) {
        self.sequence += 1;
        let event = StoreEvent {
            sequence: self.sequence,
            mutation,
        };

        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if self.subscribers.len() != before {
            debug!("Dropped {} closed store subscribers", before - self.subscribers.len());
        }
    }
}

impl std::fmt::Debug for TimerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerStore")
            .field("timers", &self.timers)
            .field("sequence", &self.sequence)
            .finish()
    }
}

//! Root of the dashboard tree: owns the store and the slot registry and routes
//! every intent to the component that owns the state it touches

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    clock::{Clock, Millis},
    ids::IdGenerator,
    intent::Intent,
    state::{ClosePolicy, FormPayload, Mutation, StoreEvent, TimerDraft, TimerRecord, TimerStore},
    view::{compose, DashboardView, SlotKey, SlotRegistry},
};

/// Point-in-time copy handed to the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// View revision: bumped on every change to timers, open flags or drafts.
    /// Store commits are numbered separately, see `StoreEvent::sequence`.
    pub revision: u64,
    pub now: Millis,
    pub timers: Vec<TimerRecord>,
    pub open_flags: BTreeMap<String, bool>,
}

impl DashboardSnapshot {
    pub fn is_open(&self, slot: &SlotKey) -> bool {
        self.open_flags.get(&slot.to_string()).copied().unwrap_or(false)
    }
}

/// Result of routing one intent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatched {
    /// Something observable changed and a new snapshot is due
    pub changed: bool,
    /// Store commit to replicate, if any
    pub mutation: Option<Mutation>,
    /// Slot whose form waits for the replication outcome
    pub awaiting_ack: Option<SlotKey>,
}

impl Dispatched {
    fn unchanged() -> Self {
        Self::default()
    }

    fn slot(changed: bool) -> Self {
        Self {
            changed,
            ..Self::default()
        }
    }

    fn store(mutation: Option<Mutation>) -> Self {
        Self {
            changed: mutation.is_some(),
            mutation,
            awaiting_ack: None,
        }
    }
}

pub struct Dashboard {
    store: TimerStore,
    slots: SlotRegistry,
    revision: u64,
    /// `after-ack` submits waiting on replication, by commit sequence
    pending_acks: HashMap<u64, SlotKey>,
}

impl Dashboard {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>, policy: ClosePolicy) -> Self {
        Self {
            store: TimerStore::new(clock, ids),
            slots: SlotRegistry::new(policy),
            revision: 0,
            pending_acks: HashMap::new(),
        }
    }

    pub fn with_timers(mut self, timers: impl IntoIterator<Item = TimerRecord>) -> Self {
        self.store = self.store.with_timers(timers);
        self
    }

    pub fn store(&self) -> &TimerStore {
        &self.store
    }

    pub fn slots(&self) -> &SlotRegistry {
        &self.slots
    }

    pub fn now(&self) -> Millis {
        self.store.now()
    }

    /// Commit stream of the underlying store
    pub fn subscribe_commits(&mut self) -> mpsc::UnboundedReceiver<StoreEvent> {
        self.store.subscribe()
    }

    pub fn awaiting_ack(&self, slot: &SlotKey) -> bool {
        self.slots.get(slot).is_some_and(|s| s.toggle.awaiting_ack())
    }

    /// Route `intent` to its owner and commit
    pub fn dispatch(&mut self, intent: Intent) -> Dispatched {
        debug!("Dispatching {} intent", intent.kind());

        let outcome = match intent {
            Intent::Create { title, project } => {
                let timer = self.store.create(TimerDraft::new(title, project));
                Dispatched::store(Some(Mutation::Create { timer }))
            }
            Intent::Update { id, title, project } => {
                Dispatched::store(self.store.update(&id, TimerDraft::new(title, project)))
            }
            Intent::Delete { id } => {
                let mutation = self.store.delete(&id);
                if mutation.is_some() && self.slots.discard(&id) {
                    debug!("Dropped edit slot of deleted timer {}", id);
                }
                Dispatched::store(mutation)
            }
            Intent::Start { id } => Dispatched::store(self.store.start(&id)),
            Intent::Stop { id } => Dispatched::store(self.store.stop(&id)),
            Intent::OpenForm { slot } => {
                let seed = match &slot {
                    SlotKey::Create => None,
                    SlotKey::Edit(id) => self.store.get(id),
                };
                Dispatched::slot(self.slots.open(&slot, seed))
            }
            Intent::CloseForm { slot } => Dispatched::slot(self.slots.close(&slot)),
            Intent::SetTitle { slot, value } => Dispatched::slot(self.slots.set_title(&slot, value)),
            Intent::SetProject { slot, value } => Dispatched::slot(self.slots.set_project(&slot, value)),
            Intent::SubmitForm { slot } => self.submit(slot),
        };

        if outcome.changed {
            self.revision += 1;
        }
        outcome
    }

    /// Settle the `after-ack` submit whose commit was `sequence`, if any.
    /// Returns the slot that changed.
    pub fn settle(&mut self, sequence: u64, outcome: Result<(), String>) -> Option<SlotKey> {
        let slot = self.pending_acks.remove(&sequence)?;
        if !self.slots.acknowledge(&slot, outcome) {
            debug!("Slot {} was closed before commit {} settled", slot, sequence);
            return None;
        }
        self.revision += 1;
        Some(slot)
    }

    pub fn snapshot(&self, now: Millis) -> DashboardSnapshot {
        let timers = self.store.snapshot();

        let mut open_flags = BTreeMap::new();
        open_flags.insert(SlotKey::Create.to_string(), self.slots.is_open(&SlotKey::Create));
        for timer in &timers {
            let key = SlotKey::Edit(timer.id.clone());
            open_flags.insert(key.to_string(), self.slots.is_open(&key));
        }

        DashboardSnapshot {
            revision: self.revision,
            now,
            timers,
            open_flags,
        }
    }

    pub fn view(&self, now: Millis) -> DashboardView {
        compose(&self.store.snapshot(), &self.slots, now)
    }

    fn submit(&mut self, slot: SlotKey) -> Dispatched {
        let store = &mut self.store;
        let mut mutation = None;

        let Some(payload) = self.slots.submit(&slot, |payload| {
            mutation = commit_payload(store, payload);
        }) else {
            debug!("Nothing to submit in slot {}", slot);
            return Dispatched::unchanged();
        };
        info!("Submitted {} form", if payload.id.is_some() { "edit" } else { "create" });

        // Edit slots are discarded with their timer, so a submit that got
        // this far always committed and `sequence()` is its commit.
        let mut awaiting_ack = None;
        if self.awaiting_ack(&slot) {
            self.pending_acks.insert(self.store.sequence(), slot.clone());
            awaiting_ack = Some(slot);
        }

        Dispatched {
            changed: true,
            mutation,
            awaiting_ack,
        }
    }
}

/// Create or update depending on whether the form was editing
fn commit_payload(store: &mut TimerStore, payload: FormPayload) -> Option<Mutation> {
    let draft = payload.draft();
    match payload.id {
        Some(id) => store.update(&id, draft),
        None => Some(Mutation::Create {
            timer: store.create(draft),
        }),
    }
}

/// The two timers the demo dashboard starts with
pub fn demo_timers(ids: &dyn IdGenerator, now: Millis) -> Vec<TimerRecord> {
    vec![
        TimerRecord {
            id: ids.next_id(),
            title: "Practice squat".to_string(),
            project: "Gym Chores".to_string(),
            elapsed_base: 5_456_099,
            running_since: Some(now),
        },
        TimerRecord {
            id: ids.next_id(),
            title: "Bake squash".to_string(),
            project: "Kitchen Chores".to_string(),
            elapsed_base: 1_273_998,
            running_since: None,
        },
    ]
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("store", &self.store)
            .field("slots", &self.slots)
            .field("revision", &self.revision)
            .finish()
    }
}

//! Per-slot toggle and form state, keyed by slot

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::{ClosePolicy, FormController, FormPayload, TimerId, TimerRecord, ToggleController};

/// A form position in the tree: the single create slot, or one timer's edit slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SlotKey {
    Create,
    Edit(TimerId),
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Create => f.write_str("create"),
            SlotKey::Edit(id) => write!(f, "edit:{}", id),
        }
    }
}

impl FromStr for SlotKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "create" => Ok(SlotKey::Create),
            Some(("edit", id)) if !id.is_empty() => Ok(SlotKey::Edit(TimerId::new(id))),
            _ => Err(format!("invalid slot key: {:?}", s)),
        }
    }
}

impl From<SlotKey> for String {
    fn from(key: SlotKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for SlotKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Toggle plus the form it shows while open
#[derive(Debug, Clone)]
pub struct Slot {
    pub toggle: ToggleController,
    pub form: Option<FormController>,
}

impl Slot {
    fn new(policy: ClosePolicy) -> Self {
        Self {
            toggle: ToggleController::new(policy),
            form: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.toggle.is_open()
    }
}

/// Slot state, created on first use and dropped with its timer.
/// Slots are independent: opening one never closes another.
#[derive(Debug, Clone)]
pub struct SlotRegistry {
    slots: HashMap<SlotKey, Slot>,
    policy: ClosePolicy,
}

impl SlotRegistry {
    pub fn new(policy: ClosePolicy) -> Self {
        Self {
            slots: HashMap::new(),
            policy,
        }
    }

    pub fn get(&self, key: &SlotKey) -> Option<&Slot> {
        self.slots.get(key)
    }

    pub fn is_open(&self, key: &SlotKey) -> bool {
        self.get(key).is_some_and(Slot::is_open)
    }

    /// Open `key`, mounting a form if none is mounted. Edit slots need the
    /// timer to seed from. Returns whether anything changed.
    pub fn open(&mut self, key: &SlotKey, seed: Option<&TimerRecord>) -> bool {
        let form = match (key, seed) {
            (SlotKey::Create, _) => FormController::create(),
            (SlotKey::Edit(_), Some(timer)) => FormController::edit(timer),
            (SlotKey::Edit(id), None) => {
                debug!("Not opening edit slot for unknown timer {}", id);
                return false;
            }
        };

        let policy = self.policy;
        let slot = self.slots.entry(key.clone()).or_insert_with(|| Slot::new(policy));
        if slot.is_open() {
            return false;
        }

        slot.toggle.open();
        slot.form = Some(form);
        true
    }

    /// Cancel the form in `key`, discarding its draft
    pub fn close(&mut self, key: &SlotKey) -> bool {
        let Some(slot) = self.slots.get_mut(key) else {
            return false;
        };
        if !slot.is_open() {
            return false;
        }

        match slot.form.take() {
            Some(form) => form.cancel(&mut slot.toggle),
            None => slot.toggle.close(),
        }
        true
    }

    pub fn set_title(&mut self, key: &SlotKey, value: String) -> bool {
        self.with_form(key, |form| form.set_title(value))
    }

    pub fn set_project(&mut self, key: &SlotKey, value: String) -> bool {
        self.with_form(key, |form| form.set_project(value))
    }

    /// Submit the form in `key` through its toggle. The form unmounts if the
    /// toggle closed.
    pub fn submit<F>(&mut self, key: &SlotKey, on_submit: F) -> Option<FormPayload>
    where
        F: FnOnce(FormPayload),
    {
        let slot = self.slots.get_mut(key)?;
        if slot.toggle.awaiting_ack() {
            debug!("Slot {} already waiting for acknowledgement", key);
            return None;
        }

        let Slot { toggle, form } = slot;
        let payload = form.as_ref()?.submit(toggle, on_submit);

        if !toggle.is_open() {
            *form = None;
        }
        Some(payload)
    }

    /// Settle a pending submit for `key`
    pub fn acknowledge(&mut self, key: &SlotKey, outcome: Result<(), String>) -> bool {
        let Some(slot) = self.slots.get_mut(key) else {
            return false;
        };

        let settled = slot.toggle.acknowledge(outcome);
        if settled && !slot.toggle.is_open() {
            slot.form = None;
        }
        settled
    }

    /// Forget the edit slot of a deleted timer
    pub fn discard(&mut self, id: &TimerId) -> bool {
        self.slots.remove(&SlotKey::Edit(id.clone())).is_some()
    }

    fn with_form(&mut self, key: &SlotKey, apply: impl FnOnce(&mut FormController)) -> bool {
        match self.slots.get_mut(key).and_then(|slot| slot.form.as_mut()) {
            Some(form) => {
                apply(form);
                true
            }
            None => {
                debug!("No open form in slot {}", key);
                false
            }
        }
    }
}

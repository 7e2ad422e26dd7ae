//! Dashboard view tree derived from store and slot state

use serde::{Deserialize, Serialize};

use super::{SlotKey, SlotRegistry};
use crate::{
    clock::Millis,
    state::{render_elapsed, FormController, TimerId, TimerRecord},
};

/// Read-only timer display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerView {
    pub id: TimerId,
    pub slot: SlotKey,
    pub title: String,
    pub project: String,
    pub elapsed_ms: Millis,
    pub elapsed: String,
    pub running: bool,
}

/// An open form with its controlled field values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormView {
    pub slot: SlotKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TimerId>,
    pub title: String,
    pub project: String,
    pub submit_label: String,
    pub awaiting_ack: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ItemView {
    Timer(TimerView),
    Form(FormView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum CreateSlotView {
    /// Closed: a button that emits `open_form` for the create slot
    Trigger { slot: SlotKey },
    Form(FormView),
}

/// dashboard -> list -> item -> {timer | form}, plus the create slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardView {
    pub now: Millis,
    pub timers: Vec<ItemView>,
    pub create_form: CreateSlotView,
}

/// Render `timers` in order, swapping in edit forms for open slots
pub fn compose(timers: &[TimerRecord], slots: &SlotRegistry, now: Millis) -> DashboardView {
    let timers = timers
        .iter()
        .map(|timer| {
            let key = SlotKey::Edit(timer.id.clone());
            match open_form(slots, &key) {
                Some(view) => ItemView::Form(view),
                None => ItemView::Timer(timer_view(timer, key, now)),
            }
        })
        .collect();

    let create_form = match open_form(slots, &SlotKey::Create) {
        Some(view) => CreateSlotView::Form(view),
        None => CreateSlotView::Trigger {
            slot: SlotKey::Create,
        },
    };

    DashboardView {
        now,
        timers,
        create_form,
    }
}

fn timer_view(timer: &TimerRecord, slot: SlotKey, now: Millis) -> TimerView {
    let elapsed_ms = timer.elapsed_at(now);
    TimerView {
        id: timer.id.clone(),
        slot,
        title: timer.title.clone(),
        project: timer.project.clone(),
        elapsed_ms,
        elapsed: render_elapsed(elapsed_ms),
        running: timer.is_running(),
    }
}

fn open_form(slots: &SlotRegistry, key: &SlotKey) -> Option<FormView> {
    let slot = slots.get(key).filter(|s| s.is_open())?;
    let form = slot.form.as_ref()?;
    Some(form_view(key, form, slot.toggle.awaiting_ack(), slot.toggle.error()))
}

fn form_view(key: &SlotKey, form: &FormController, awaiting_ack: bool, error: Option<&str>) -> FormView {
    FormView {
        slot: key.clone(),
        id: form.id().cloned(),
        title: form.title().to_string(),
        project: form.project().to_string(),
        submit_label: if form.is_edit() { "Update" } else { "Create" }.to_string(),
        awaiting_ack,
        error: error.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::state::{ClosePolicy, TimerDraft};

    fn timers() -> Vec<TimerRecord> {
        vec![
            TimerRecord {
                id: TimerId::new("a"),
                title: "Practice squat".into(),
                project: "Gym Chores".into(),
                elapsed_base: 5_456_099,
                running_since: Some(1_000),
            },
            TimerRecord::new(TimerId::new("b"), TimerDraft::new("Bake squash", "Kitchen Chores")),
        ]
    }

    #[test]
    fn closed_slots_render_displays_and_trigger() {
        let slots = SlotRegistry::new(ClosePolicy::Immediate);
        let view = compose(&timers(), &slots, 2_000);

        assert_eq!(view.timers.len(), 2);
        assert_matches!(&view.timers[0], ItemView::Timer(t) if t.elapsed_ms == 5_457_099 && t.running);
        assert_matches!(&view.timers[1], ItemView::Timer(t) if t.elapsed == "00:00:00" && !t.running);
        assert_matches!(view.create_form, CreateSlotView::Trigger { slot: SlotKey::Create });
    }

    #[test]
    fn open_edit_slot_renders_seeded_form() {
        let timers = timers();
        let mut slots = SlotRegistry::new(ClosePolicy::Immediate);
        slots.open(&SlotKey::Edit(TimerId::new("b")), Some(&timers[1]));

        let view = compose(&timers, &slots, 0);
        assert_matches!(&view.timers[0], ItemView::Timer(_));
        assert_matches!(
            &view.timers[1],
            ItemView::Form(f) if f.title == "Bake squash" && f.submit_label == "Update"
        );
    }

    #[test]
    fn open_create_slot_renders_empty_form() {
        let mut slots = SlotRegistry::new(ClosePolicy::Immediate);
        slots.open(&SlotKey::Create, None);

        let view = compose(&[], &slots, 0);
        assert!(view.timers.is_empty());
        assert_matches!(
            view.create_form,
            CreateSlotView::Form(FormView { id: None, ref title, ref submit_label, .. })
                if title.is_empty() && submit_label == "Create"
        );
    }

    #[test]
    fn view_serializes_with_tags() {
        let slots = SlotRegistry::new(ClosePolicy::Immediate);
        let json = serde_json::to_value(compose(&timers(), &slots, 1_000)).unwrap();

        assert_eq!(json["timers"][0]["view"], "timer");
        assert_eq!(json["timers"][0]["slot"], "edit:a");
        assert_eq!(json["create_form"]["view"], "trigger");
        assert_eq!(json["create_form"]["slot"], "create");
    }
}

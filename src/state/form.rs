//! Transient draft for one open create/edit form

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{TimerDraft, TimerId, TimerRecord, ToggleController};

/// What a form hands upward on submit. `id` is set when editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TimerId>,
    pub title: String,
    pub project: String,
}

impl FormPayload {
    pub fn draft(&self) -> TimerDraft {
        TimerDraft::new(self.title.clone(), self.project.clone())
    }
}

/// Controlled fields for a mounted form. The draft is the only copy of the
/// field values; it is dropped with the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormController {
    id: Option<TimerId>,
    draft: TimerDraft,
}

impl FormController {
    /// Empty form for a new timer
    pub fn create() -> Self {
        Self {
            id: None,
            draft: TimerDraft::default(),
        }
    }

    /// Form seeded from an existing timer
    pub fn edit(timer: &TimerRecord) -> Self {
        Self {
            id: Some(timer.id.clone()),
            draft: timer.draft(),
        }
    }

    pub fn id(&self) -> Option<&TimerId> {
        self.id.as_ref()
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    pub fn title(&self) -> &str {
        &self.draft.title
    }

    pub fn project(&self) -> &str {
        &self.draft.project
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.draft.title = value.into();
    }

    pub fn set_project(&mut self, value: impl Into<String>) {
        self.draft.project = value.into();
    }

    pub fn payload(&self) -> FormPayload {
        FormPayload {
            id: self.id.clone(),
            title: self.draft.title.clone(),
            project: self.draft.project.clone(),
        }
    }

    /// Pass the current draft through the slot's toggle to `on_submit`
    pub fn submit<F>(&self, toggle: &mut ToggleController, on_submit: F) -> FormPayload
    where
        F: FnOnce(FormPayload),
    {
        let payload = self.payload();
        debug!("Submitting form for {:?}", self.id);
        toggle.submit_and_close(payload.clone(), on_submit);
        payload
    }

    /// Discard the draft and close the slot
    pub fn cancel(self, toggle: &mut ToggleController) {
        debug!("Cancelling form for {:?}", self.id);
        toggle.close();
    }
}

//! User intents bubbled up from leaf views

use serde::{Deserialize, Serialize};

use crate::{state::TimerId, view::SlotKey};

/// Everything a view can ask for. Store intents end at the timer store; slot
/// intents end at the slot's toggle or form controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    Create {
        #[serde(default)]
        title: String,
        #[serde(default)]
        project: String,
    },
    Update {
        id: TimerId,
        #[serde(default)]
        title: String,
        #[serde(default)]
        project: String,
    },
    Delete { id: TimerId },
    Start { id: TimerId },
    Stop { id: TimerId },
    OpenForm { slot: SlotKey },
    CloseForm { slot: SlotKey },
    SetTitle { slot: SlotKey, value: String },
    SetProject { slot: SlotKey, value: String },
    SubmitForm { slot: SlotKey },
}

impl Intent {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::Create { .. } => "create",
            Intent::Update { .. } => "update",
            Intent::Delete { .. } => "delete",
            Intent::Start { .. } => "start",
            Intent::Stop { .. } => "stop",
            Intent::OpenForm { .. } => "open_form",
            Intent::CloseForm { .. } => "close_form",
            Intent::SetTitle { .. } => "set_title",
            Intent::SetProject { .. } => "set_project",
            Intent::SubmitForm { .. } => "submit_form",
        }
    }
}

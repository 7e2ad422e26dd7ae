//! Timer record and elapsed-time arithmetic

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::Millis;

/// Opaque timer identifier, fixed at creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Editable fields of a timer, as entered in a form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub project: String,
}

impl TimerDraft {
    pub fn new(title: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            project: project.into(),
        }
    }
}

/// One timer. Running exactly when `running_since` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub id: TimerId,
    pub title: String,
    pub project: String,
    /// Accumulated milliseconds as of the last stop
    pub elapsed_base: Millis,
    pub running_since: Option<Millis>,
}

impl TimerRecord {
    /// A stopped timer with nothing accumulated
    pub fn new(id: TimerId, draft: TimerDraft) -> Self {
        Self {
            id,
            title: draft.title,
            project: draft.project,
            elapsed_base: 0,
            running_since: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Displayed elapsed at `now`
    pub fn elapsed_at(&self, now: Millis) -> Millis {
        elapsed_ms(self, now)
    }

    pub fn draft(&self) -> TimerDraft {
        TimerDraft::new(self.title.clone(), self.project.clone())
    }
}

/// `elapsed_base + (now - running_since)` while running, `elapsed_base` otherwise.
///
/// A `now` earlier than `running_since` contributes nothing, so the result is
/// never below the frozen base.
pub fn elapsed_ms(record: &TimerRecord, now: Millis) -> Millis {
    match record.running_since {
        Some(since) => record.elapsed_base + now.saturating_sub(since),
        None => record.elapsed_base,
    }
}

/// Render milliseconds as `HH:MM:SS`. Hours are not capped at two digits.
pub fn render_elapsed(ms: Millis) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

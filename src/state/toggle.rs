//! Open/closed flag for a single form slot

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// When a submitted form closes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClosePolicy {
    /// Close right after handing the draft to the owner, whatever happens remotely
    #[default]
    Immediate,
    /// Stay open until the remote collaborator acknowledges; re-open with an
    /// error message on failure
    AfterAck,
}

/// Owns one form slot's visibility
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleController {
    is_open: bool,
    awaiting_ack: bool,
    error: Option<String>,
    policy: ClosePolicy,
}

impl ToggleController {
    pub fn new(policy: ClosePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn awaiting_ack(&self) -> bool {
        self.awaiting_ack
    }

    /// Message from the last failed acknowledgement, cleared on open/close
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn open(&mut self) {
        debug!("Opening form slot");
        self.is_open = true;
        self.error = None;
    }

    pub fn close(&mut self) {
        debug!("Closing form slot");
        self.is_open = false;
        self.awaiting_ack = false;
        self.error = None;
    }

    /// Hand `payload` to the owner's callback, then close according to policy.
    ///
    /// Under `Immediate` the slot closes regardless of what the callback does.
    pub fn submit_and_close<P, F>(&mut self, payload: P, on_submit: F)
    where
        F: FnOnce(P),
    {
        on_submit(payload);

        match self.policy {
            ClosePolicy::Immediate => self.close(),
            ClosePolicy::AfterAck => {
                debug!("Form submitted, waiting for acknowledgement");
                self.awaiting_ack = true;
                self.error = None;
            }
        }
    }

    /// Settle a pending `AfterAck` submit. Returns false if nothing was pending.
    pub fn acknowledge(&mut self, outcome: Result<(), String>) -> bool {
        if !self.awaiting_ack {
            return false;
        }

        match outcome {
            Ok(()) => self.close(),
            Err(message) => {
                debug!("Submit rejected, re-opening form: {}", message);
                self.awaiting_ack = false;
                self.is_open = true;
                self.error = Some(message);
            }
        }
        true
    }
}

//! State management module
//!
//! Each piece of mutable state has exactly one owner here: the timer store owns
//! the collection, toggles own open flags, forms own drafts, and `AppState`
//! serializes access to all of them for the async server.

pub mod app_state;
pub mod form;
pub mod store;
pub mod timer;
pub mod toggle;

// Re-export main types
pub use app_state::AppState;
pub use form::{FormController, FormPayload};
pub use store::{Mutation, StoreEvent, TimerStore};
pub use timer::{elapsed_ms, render_elapsed, TimerDraft, TimerId, TimerRecord};
pub use toggle::{ClosePolicy, ToggleController};

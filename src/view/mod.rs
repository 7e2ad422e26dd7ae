//! View composition module
//!
//! Not a state owner: slots hold per-form controller state, and `compose`
//! turns a store snapshot plus slot state into a serializable view tree.

pub mod compose;
pub mod slots;

pub use compose::{compose, CreateSlotView, DashboardView, FormView, ItemView, TimerView};
pub use slots::{Slot, SlotKey, SlotRegistry};

//! Timers Dashboard - single-owner state for a list of start/stop timers
//!
//! The timer store owns the collection, each form slot owns its open flag and
//! draft, snapshots flow down to the views and intents bubble back up to
//! whichever component owns the state they touch.

pub mod api;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod ids;
pub mod intent;
pub mod persistence;
pub mod state;
pub mod tasks;
pub mod utils;
pub mod view;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use intent::Intent;
pub use state::AppState;
pub use utils::signals::shutdown_signal;

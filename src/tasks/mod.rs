//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod clock_tick;
pub mod replication;

// Re-export main functions
pub use clock_tick::clock_tick_task;
pub use replication::replication_task;

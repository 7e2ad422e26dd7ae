//! Identifier generation for new timers

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::state::TimerId;

/// Opaque unique-id source, called exactly once per created timer
pub trait IdGenerator: Send + Sync + 'static {
    fn next_id(&self) -> TimerId;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> TimerId {
        TimerId::new(Uuid::new_v4().to_string())
    }
}

/// Deterministic `timer-1`, `timer-2`, ... ids
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> TimerId {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        TimerId::new(format!("timer-{}", n))
    }
}

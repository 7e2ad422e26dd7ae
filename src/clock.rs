//! Wall-clock source for timer arithmetic

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Instant, SystemTime, UNIX_EPOCH},
};

/// Milliseconds since the Unix epoch
pub type Millis = u64;

/// Supplies the current instant. Readings must never decrease.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Millis;
}

/// Production clock: wall-clock anchored, advanced by a monotonic `Instant`
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor_ms: Millis,
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        let anchor_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Millis)
            .unwrap_or(0);

        Self {
            anchor_ms,
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        self.anchor_ms + self.anchor.elapsed().as_millis() as Millis
    }
}

/// Hand-driven clock for tests and demos
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move the clock to `at`. Earlier instants are ignored.
    pub fn set(&self, at: Millis) {
        self.now.fetch_max(at, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Millis) {
        self.now.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_never_goes_backwards() {
        let clock = SystemClock::new();
        let mut last = clock.now();
        for _ in 0..1000 {
            let now = clock.now();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn manual_clock_ignores_rewinds() {
        let clock = ManualClock::new(1_000);
        clock.advance(500);
        assert_eq!(clock.now(), 1_500);

        clock.set(200);
        assert_eq!(clock.now(), 1_500);

        clock.set(9_000);
        assert_eq!(clock.now(), 9_000);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(0);
        let handle = clock.clone();
        handle.advance(42);
        assert_eq!(clock.now(), 42);
    }
}

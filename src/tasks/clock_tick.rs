//! Clock tick background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::state::AppState;

/// Republish the dashboard snapshot every `period` so running timers redraw.
/// The tick fires regardless of how many timers are running.
pub async fn clock_tick_task(state: Arc<AppState>, period: Duration) {
    info!("Starting clock tick task ({}ms)", period.as_millis());

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        if let Err(e) = state.tick() {
            warn!("Failed to publish tick: {}", e);
        }
    }
}

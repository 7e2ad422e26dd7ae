//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    clock::Millis,
    state::{render_elapsed, TimerId, TimerRecord},
    view::DashboardView,
};

/// Response for every intent-dispatching endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub dashboard: DashboardView,
}

impl ApiResponse {
    pub fn ok(action: &str, dashboard: DashboardView) -> Self {
        Self {
            status: "ok".to_string(),
            action: action.to_string(),
            timestamp: Utc::now(),
            dashboard,
        }
    }
}

/// A timer record with its elapsed time worked out for `now`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerResponse {
    #[serde(flatten)]
    pub timer: TimerRecord,
    pub elapsed_ms: Millis,
    pub elapsed: String,
}

impl TimerResponse {
    pub fn at(timer: TimerRecord, now: Millis) -> Self {
        let elapsed_ms = timer.elapsed_at(now);
        Self {
            timer,
            elapsed_ms,
            elapsed: render_elapsed(elapsed_ms),
        }
    }
}

/// Body of `PUT /api/timers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTimerRequest {
    pub id: TimerId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub project: String,
}

/// Body of endpoints that only name a timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerIdRequest {
    pub id: TimerId,
}

/// Server status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub revision: u64,
    pub timers: usize,
    pub running: usize,
    pub open_forms: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::error;

use crate::{
    dashboard::DashboardSnapshot,
    intent::Intent,
    state::{AppState, TimerDraft},
    view::DashboardView,
};
use super::responses::{
    ApiResponse, HealthResponse, StatusResponse, TimerIdRequest, TimerResponse, UpdateTimerRequest,
};

async fn dispatch(state: &AppState, intent: Intent) -> Result<Json<ApiResponse>, StatusCode> {
    let action = intent.kind();
    match state.dispatch(intent).await {
        Ok(view) => Ok(Json(ApiResponse::ok(action, view))),
        Err(e) => {
            error!("Failed to dispatch {}: {}", action, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /api/intents - Route any intent to its owner
pub async fn intent_handler(
    State(state): State<Arc<AppState>>,
    Json(intent): Json<Intent>,
) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch(&state, intent).await
}

/// Handle POST /api/timers - Create a timer
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<TimerDraft>,
) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch(
        &state,
        Intent::Create {
            title: draft.title,
            project: draft.project,
        },
    )
    .await
}

/// Handle PUT /api/timers - Update title and project
pub async fn update_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateTimerRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch(
        &state,
        Intent::Update {
            id: req.id,
            title: req.title,
            project: req.project,
        },
    )
    .await
}

/// Handle DELETE /api/timers - Delete a timer
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TimerIdRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch(&state, Intent::Delete { id: req.id }).await
}

/// Handle POST /api/timers/start
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TimerIdRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch(&state, Intent::Start { id: req.id }).await
}

/// Handle POST /api/timers/stop
pub async fn stop_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TimerIdRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    dispatch(&state, Intent::Stop { id: req.id }).await
}

/// Handle GET /api/timers - Timers with elapsed worked out for now
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TimerResponse>>, StatusCode> {
    let snapshot = snapshot(&state)?;
    let now = snapshot.now;

    Ok(Json(
        snapshot
            .timers
            .into_iter()
            .map(|timer| TimerResponse::at(timer, now))
            .collect(),
    ))
}

/// Handle GET /api/snapshot - Timers plus open flags
pub async fn snapshot_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardSnapshot>, StatusCode> {
    snapshot(&state).map(Json)
}

/// Handle GET /api/dashboard - Composed view tree
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, StatusCode> {
    match state.get_view() {
        Ok(view) => Ok(Json(view)),
        Err(e) => {
            error!("Failed to compose dashboard: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return current server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let snapshot = snapshot(&state)?;
    let last_action = state.last_action();

    Ok(Json(StatusResponse {
        revision: snapshot.revision,
        timers: snapshot.timers.len(),
        running: snapshot.timers.iter().filter(|t| t.is_running()).count(),
        open_forms: snapshot.open_flags.values().filter(|open| **open).count(),
        uptime: state.uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action_time: last_action.as_ref().map(|last| last.at),
        last_action: last_action.map(|last| last.action.to_string()),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

fn snapshot(state: &AppState) -> Result<DashboardSnapshot, StatusCode> {
    state.get_snapshot().map_err(|e| {
        error!("Failed to get snapshot: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

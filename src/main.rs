//! Timers Dashboard - HTTP server entry point

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use timers_dashboard::{
    api::create_router,
    clock::{Clock, SystemClock},
    config::Config,
    dashboard::{demo_timers, Dashboard},
    ids::{IdGenerator, UuidGenerator},
    persistence::{JournalSync, NoopSync, RemoteSync},
    state::AppState,
    tasks::clock_tick_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timers_dashboard={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timers-dashboard v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, tick={}ms, close_policy={:?}",
        config.host, config.port, config.tick_ms, config.close_policy
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let ids: Arc<dyn IdGenerator> = Arc::new(UuidGenerator);

    let remote: Arc<dyn RemoteSync> = match &config.journal {
        Some(path) => {
            info!("Journaling mutations to {}", path.display());
            Arc::new(JournalSync::new(path))
        }
        None => Arc::new(NoopSync),
    };

    let mut dashboard = Dashboard::new(Arc::clone(&clock), Arc::clone(&ids), config.close_policy);
    if config.seed {
        dashboard = dashboard.with_timers(demo_timers(ids.as_ref(), clock.now()));
    }

    // Create application state; this also starts the replication task
    let state = AppState::new(
        config.port,
        config.host.clone(),
        dashboard,
        Arc::clone(&clock),
        remote,
    );
    state.log_summary().map_err(anyhow::Error::msg)?;

    // Start the clock tick background task
    let tick_state = Arc::clone(&state);
    let tick_interval = config.tick_interval();
    tokio::spawn(async move {
        clock_tick_task(tick_state, tick_interval).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /api/timers       - Timers with elapsed time");
    info!("  POST   /api/timers       - Create a timer");
    info!("  PUT    /api/timers       - Update title/project");
    info!("  DELETE /api/timers       - Delete a timer");
    info!("  POST   /api/timers/start - Start a timer");
    info!("  POST   /api/timers/stop  - Stop a timer");
    info!("  POST   /api/intents      - Dispatch any intent");
    info!("  GET    /api/snapshot     - Timers and open form flags");
    info!("  GET    /api/dashboard    - Composed view tree");
    info!("  GET    /status           - Server status");
    info!("  GET    /health           - Health check");

    // Setup graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

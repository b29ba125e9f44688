//! HTTP server setup and routing

use crate::calibration::CalibrationStore;
use crate::error::{Error, Result};
use crate::scheduler::SchedulerHandle;
use axum::{
    routing::{get, post},
    Router,
};
use clicksync_common::events::EventBus;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    /// Running click scheduler
    pub scheduler: SchedulerHandle,
    /// Calibration store; the lock is held across the flush, so appends
    /// never overwrite each other on disk
    pub store: Arc<Mutex<CalibrationStore>>,
    /// Broadcast of clicks and parameter changes
    pub events: EventBus,
}

impl AppContext {
    pub fn new(scheduler: SchedulerHandle, store: CalibrationStore, events: EventBus) -> Self {
        Self {
            scheduler,
            store: Arc::new(Mutex::new(store)),
            events,
        }
    }
}

/// Build the router with all routes
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))

        // Scheduler control
        .route(
            "/api/v1/parameters",
            get(super::handlers::get_parameters).post(super::handlers::set_parameters),
        )

        // Calibration
        .route("/api/v1/calibration", post(super::handlers::store_calibration))
        .route(
            "/api/v1/calibration/request",
            post(super::handlers::request_calibration),
        )
        .route("/api/v1/calibration/devices", get(super::handlers::list_devices))

        // SSE event stream
        .route("/api/v1/events", get(super::sse::event_stream))

        // Attach application context
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())

        // Players are browsers served from other origins
        .layer(CorsLayer::permissive())
}

/// Run HTTP API server until `shutdown` resolves
pub async fn run(
    port: u16,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = build_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}

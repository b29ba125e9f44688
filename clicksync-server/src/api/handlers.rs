//! HTTP request handlers

use crate::api::server::AppContext;
use crate::calibration::Lookup;
use crate::error::{Error, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use clicksync_common::events::{CalibrationStoredInfo, ClickSyncEvent};
use clicksync_common::protocol::{
    CalibrationRequest, CalibrationResponse, CalibrationStoreRequest, SchedulerConfig,
    SchedulerPatch,
};
use serde::Serialize;
use tracing::{debug, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    devices: Vec<String>,
}

// ============================================================================
// Health
// ============================================================================

/// GET /health - Health check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "clicksync-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
    })
}

// ============================================================================
// Scheduler Endpoints
// ============================================================================

/// GET /api/v1/parameters - Current scheduler parameters
pub async fn get_parameters(State(ctx): State<AppContext>) -> Result<Json<SchedulerConfig>> {
    Ok(Json(ctx.scheduler.snapshot().await?))
}

/// POST /api/v1/parameters - Partial reconfiguration
///
/// Absent fields keep their value. Returns the full resulting parameters.
pub async fn set_parameters(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<SchedulerPatch>, JsonRejection>,
) -> Result<Json<SchedulerConfig>> {
    let Json(patch) = payload?;
    if patch.is_empty() {
        debug!("Empty reconfiguration, broadcasting current parameters");
    }
    Ok(Json(ctx.scheduler.reconfigure(patch).await?))
}

// ============================================================================
// Calibration Endpoints
// ============================================================================

/// POST /api/v1/calibration - Store calibration values of a device
pub async fn store_calibration(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<CalibrationStoreRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(request) = payload?;
    let identifier = validate_identifier(&request.identifier)?;

    let summary = {
        let mut store = ctx.store.lock().await;
        store.append(identifier, request.audio.as_ref(), request.network.as_ref())
    };

    if summary.changed() {
        info!(
            "Stored calibration for {:?}: outputs {:?}, network {}",
            identifier, summary.outputs, summary.network
        );
        ctx.events
            .emit_lossy(ClickSyncEvent::CalibrationStored(CalibrationStoredInfo {
                identifier: identifier.to_string(),
                outputs: summary.outputs,
                network: summary.network,
                timestamp: summary.recorded_at,
            }));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/calibration/request - Current calibration of a device
///
/// Falls back to the closest stored identifier. An empty object means no
/// calibration is available.
pub async fn request_calibration(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<CalibrationRequest>, JsonRejection>,
) -> Result<Json<CalibrationResponse>> {
    let Json(request) = payload?;
    let identifier = validate_identifier(&request.identifier)?;

    let lookup = ctx.store.lock().await.lookup(identifier);
    match &lookup {
        Lookup::Exact(_) => debug!("Calibration found for {:?}", identifier),
        Lookup::Fuzzy { key, distance, .. } => info!(
            "Calibration for {:?} taken from {:?} (distance {})",
            identifier, key, distance
        ),
        Lookup::NotFound => info!("No calibration available for {:?}", identifier),
    }

    Ok(Json(lookup.into_response()))
}

/// GET /api/v1/calibration/devices - Known device identifiers
pub async fn list_devices(State(ctx): State<AppContext>) -> Json<DeviceListResponse> {
    let devices = ctx.store.lock().await.devices();
    Json(DeviceListResponse { devices })
}

fn validate_identifier(identifier: &str) -> Result<&str> {
    if identifier.is_empty() {
        return Err(Error::BadRequest("identifier must not be empty".to_string()));
    }
    Ok(identifier)
}

//! Health check endpoint

use axum::{extract::State, Json};
use chrono::Utc;
use np_common::api::BuildInfo;
use serde::Serialize;

use crate::services::ServiceHealth;
use crate::{AppState, MODULE_NAME};

/// Gateway health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "OK" while the gateway answers; per-service state is in `services`
    pub status: &'static str,
    pub services: ServiceHealth,
    pub module: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
}

/// GET /api/health
///
/// Probes every classifier service concurrently, each bounded by the health timeout.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let services = state.services.health().await;

    let uptime = Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0) as u64;

    Json(HealthResponse {
        status: "OK",
        services,
        module: MODULE_NAME,
        version: state.build.version.clone(),
        uptime_seconds: uptime,
    })
}

/// GET /api/buildinfo
pub async fn buildinfo(State(state): State<AppState>) -> Json<BuildInfo> {
    Json(state.build.clone())
}

//! Health check handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub locator: String,
    pub model_profile: String,
    pub frame_stride: usize,
    pub failure_policy: String,
}

/// Readiness check endpoint (readiness probe).
///
/// Models are loaded before the server binds, so a running server is ready.
pub async fn ready(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let analyzer = state.service.analyzer();
    let options = state.service.options();
    Json(ReadinessResponse {
        status: "ready".to_string(),
        locator: analyzer.locator().name().to_string(),
        model_profile: analyzer.classifier().profile().name.clone(),
        frame_stride: options.stride,
        failure_policy: options.failure_policy.as_str().to_string(),
    })
}

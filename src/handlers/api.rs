use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Service name reported by the health check
pub const SERVICE_NAME: &str = "voice-relay";

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    /// Whether a Gemini API key is available
    pub gemini_configured: bool,
}

/// Health check handler
///
/// Always answers `ok` while the process is serving. Missing Gemini
/// credentials are reported but do not fail the check.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        gemini_configured: state.config.gemini_configured(),
    })
}

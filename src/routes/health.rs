//! Service info, health, and status endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::state::AppState;
use crate::types::{HealthResponse, ServiceInfoResponse, StatusResponse};

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/status", get(status))
}

/// Root endpoint with service information
/// GET /
async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    let response = ServiceInfoResponse {
        service: "ROFL x402 Document Summarization".to_string(),
        endpoint: "POST /summarize-doc".to_string(),
        price: state.x402_price().to_string(),
        network: state.x402_network().to_string(),
        ai_provider: state.provider().as_str().to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Health check endpoint
/// GET /health
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        signing_enabled: state.signer().is_enabled(),
        ai_provider: state.provider().as_str().to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Detailed status endpoint
/// GET /status
async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let response = StatusResponse {
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ai_provider: state.provider().as_str().to_string(),
        signing_public_key: state.signer().public_key_hex().map(str::to_string),
        total_jobs: state.total_jobs(),
        uptime_secs: state.uptime_secs(),
    };

    (StatusCode::OK, Json(response))
}

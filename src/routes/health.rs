//! Health check endpoints
//!
//! Liveness returns 200 whenever the service is running; there is no
//! external dependency worth gating readiness on (the LRS is contacted
//! per-request and its failures surface in the report itself).

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

#[derive(Serialize)]
struct HealthResponse {
    healthy: bool,
    version: &'static str,
    sessions: usize,
    timestamp: String,
}

/// Handle GET /health and /healthz
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let health = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.sessions.len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    let body = serde_json::to_string(&health).unwrap_or_default();
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Handle GET /version
pub fn version_info() -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

//! Health check endpoints.

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Liveness check: 200 OK whenever the process is serving.
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    /// Whether the service should receive traffic.
    pub ready: bool,
}

/// Readiness check: the router only exists once the stores connected, so
/// reaching this handler means dependencies were wired successfully.
pub async fn readiness_check() -> Json<ReadinessResponse> {
    Json(ReadinessResponse { ready: true })
}

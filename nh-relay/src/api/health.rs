//! Health check endpoint
//!
//! Also the target of the keep-alive ping.

use axum::{extract::State, routing::get, Json, Router};
use nh_common::api::HealthResponse;
use nh_common::time;

use crate::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = time::now();
    let uptime = (now - state.startup_time).num_seconds();
    tracing::debug!(uptime_secs = uptime, "Health check");

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: time::to_iso8601(now),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

//! nh-relay library - stateless relay between the client and the upstream vision model
//!
//! Exposes the router and its state for the binary and for integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod keepalive;
pub mod upstream;

pub use crate::config::{DeploymentMode, RelayConfig};
pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::upstream::{UpstreamClient, UpstreamError};

/// Application state shared across handlers
///
/// Read-only after startup; requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub upstream: Arc<UpstreamClient>,
    /// Service startup timestamp
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            upstream: Arc::new(upstream),
            startup_time: Utc::now(),
        })
    }
}

/// CORS policy: any origin (mirrored so credentials stay allowed)
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .merge(api::analyze_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! HTTP API handlers for nh-relay

pub mod analyze;
pub mod health;

pub use analyze::{analyze_image, analyze_routes};
pub use health::{health_check, health_routes};

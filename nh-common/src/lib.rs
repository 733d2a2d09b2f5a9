//! # Not Hamburger Common Library
//!
//! Shared code for the relay service and the client:
//! - Answer normalization (canonical tokens and the client heuristic)
//! - Data-URL helpers
//! - API request/response types
//! - Configuration file loading and setting resolution
//! - Tracing subscriber setup
//! - Timestamp utilities

pub mod api;
pub mod classify;
pub mod config;
pub mod data_url;
pub mod error;
pub mod logging;
pub mod time;

pub use classify::{detect_hamburger, Verdict};
pub use error::{Error, Result};

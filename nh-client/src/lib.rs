//! # nh-client
//!
//! Client side of Not Hamburger: picks a photo, compresses it under the
//! upload budget, sends it to the relay and turns the reply into a verdict.
//!
//! The flow controller only talks to platform services through the traits
//! in [`platform`], [`compressor`] and [`api`]; [`desktop`] and [`jpeg`]
//! provide the terminal implementations.

pub mod api;
pub mod compressor;
pub mod config;
pub mod desktop;
pub mod flow;
pub mod jpeg;
pub mod platform;

pub use api::{Analyzer, ClientError, RelayClient};
pub use compressor::{CompressError, ImageCompressor, ImageManipulator, PreparedImage};
pub use config::ClientConfig;
pub use flow::{AnalysisResult, FlowController, FlowState, Screen, SelectedImage};

//! API types shared by the relay service and its clients

pub mod types;

pub use types::{
    AnalyzeImageResponse, AnalyzeRequest, Choice, ChoiceMessage, ErrorResponse, HealthResponse,
};

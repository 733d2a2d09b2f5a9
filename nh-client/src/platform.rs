//! Platform collaborators the flow controller depends on
//!
//! Camera, photo library, file picker and share sheet are platform
//! services; the flow only sees these traits.

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Where a photo comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Camera,
    Library,
    Files,
}

impl ImageSource {
    /// Name used when the platform gives the asset none
    pub fn fallback_name(self) -> &'static str {
        match self {
            ImageSource::Camera => "camera",
            ImageSource::Library | ImageSource::Files => "photo",
        }
    }

    /// Status message shown when access is refused
    pub fn permission_message(self) -> Option<&'static str> {
        match self {
            ImageSource::Camera => Some("Camera access is required to take a photo."),
            ImageSource::Library => Some("Photo library access is required to choose an image."),
            ImageSource::Files => None,
        }
    }
}

impl FromStr for ImageSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "camera" => Ok(ImageSource::Camera),
            "library" => Ok(ImageSource::Library),
            "files" | "file" => Ok(ImageSource::Files),
            other => Err(format!("unknown image source '{}'", other)),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageSource::Camera => "camera",
            ImageSource::Library => "library",
            ImageSource::Files => "files",
        })
    }
}

/// What a picker hands back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedAsset {
    pub uri: String,
    /// File name as reported by the platform, if any
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(PickedAsset),
    /// User backed out, or the picker returned no asset
    Cancelled,
}

#[derive(Debug, Error)]
pub enum PickError {
    #[error("{0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("Share failed: {0}")]
pub struct ShareError(pub String);

#[async_trait]
pub trait ImagePicker: Send + Sync {
    /// Ask for access to `source`; only consulted for camera and library
    async fn request_permission(&self, source: ImageSource) -> bool;

    async fn pick(&self, source: ImageSource) -> Result<PickOutcome, PickError>;
}

#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// Fire-and-forget share of a text message
    async fn share(&self, message: &str) -> Result<(), ShareError>;
}

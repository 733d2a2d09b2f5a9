//! Terminal implementations of the platform traits
//!
//! There is no camera or photo library on a terminal, so only the file
//! source can pick anything. Sharing prints the message to stdout.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::platform::{
    ImagePicker, ImageSource, PickError, PickOutcome, PickedAsset, ShareError, ShareTarget,
};

/// Picks a single file given up front
pub struct FilePicker {
    path: Option<PathBuf>,
}

impl FilePicker {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ImagePicker for FilePicker {
    async fn request_permission(&self, source: ImageSource) -> bool {
        let granted = matches!(source, ImageSource::Files);
        if !granted {
            warn!("No {} available on this platform", source);
        }
        granted
    }

    async fn pick(&self, source: ImageSource) -> Result<PickOutcome, PickError> {
        if source != ImageSource::Files {
            return Err(PickError::Unavailable(format!(
                "Picking from the {} is not supported here.",
                source
            )));
        }

        let Some(path) = &self.path else {
            return Ok(PickOutcome::Cancelled);
        };

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(PickError::Unavailable(format!("{} is not a file.", path.display())));
        }

        info!("Picked {}", path.display());
        Ok(PickOutcome::Picked(PickedAsset {
            uri: path.to_string_lossy().into_owned(),
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        }))
    }
}

/// Prints shared text to stdout
pub struct ConsoleShare;

#[async_trait]
impl ShareTarget for ConsoleShare {
    async fn share(&self, message: &str) -> Result<(), ShareError> {
        println!("{}", message);
        Ok(())
    }
}

//! Client flow controller
//!
//! Drives the three screens (upload, preview, result) from four user
//! actions: pick, analyze, share, reset. Actions run one at a time; every
//! failure ends up as a status message, never as a returned error.

use nh_common::detect_hamburger;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::Analyzer;
use crate::compressor::{ImageCompressor, PreparedImage};
use crate::platform::{ImagePicker, ImageSource, PickOutcome, PickedAsset, ShareTarget};

/// Description used when the relay response carries no content
pub const NO_RESPONSE: &str = "NO_RESPONSE";

const GENERIC_PICK_FAILURE: &str = "We could not process that image. Please try another photo.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    Preview,
    Result,
}

/// The photo the user picked, compressed and ready to upload
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    pub uri: String,
    pub data_url: String,
    pub mime_type: String,
    pub name: String,
    pub approx_bytes: usize,
}

impl SelectedImage {
    fn from_prepared(prepared: PreparedImage, name: String) -> Self {
        Self {
            uri: prepared.uri,
            data_url: prepared.data_url,
            mime_type: prepared.mime_type,
            name,
            approx_bytes: prepared.approx_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub description: String,
    pub is_hamburger: bool,
}

/// What the front-end should render
#[derive(Debug, Clone, PartialEq)]
pub enum Screen<'a> {
    Upload {
        status_message: Option<&'a str>,
    },
    Preview {
        image_uri: &'a str,
        file_name: &'a str,
        analyzing: bool,
    },
    Result {
        result: &'a AnalysisResult,
        image_uri: &'a str,
    },
}

/// Replace the extension with `.jpg`; `photo.jpg` when there is no name
pub fn ensure_jpeg_name(input: Option<&str>) -> String {
    let Some(input) = input.filter(|s| !s.is_empty()) else {
        return "photo.jpg".to_string();
    };

    let base = match input.rfind('.') {
        Some(dot) if dot + 1 < input.len() && !input[dot + 1..].contains('/') => &input[..dot],
        _ => input,
    };
    let base = if base.is_empty() { "photo" } else { base };

    format!("{}.jpg", base)
}

/// Text handed to the share sheet
pub fn share_message(result: &AnalysisResult, app_name: &str, share_url: &str) -> String {
    let headline = if result.is_hamburger {
        "I ate a hamburger! ✅"
    } else {
        "This is not a hamburger. ❌"
    };
    format!("{}\n\nTry {}: {}", headline, app_name, share_url)
}

enum PickFailure {
    PermissionDenied(&'static str),
    Failed(String),
}

pub struct FlowController {
    picker: Arc<dyn ImagePicker>,
    compressor: ImageCompressor,
    analyzer: Arc<dyn Analyzer>,
    share_target: Arc<dyn ShareTarget>,
    app_name: String,
    share_url: String,

    state: FlowState,
    selected: Option<SelectedImage>,
    result: Option<AnalysisResult>,
    status_message: Option<String>,
    analyzing: bool,
}

impl FlowController {
    pub fn new(
        picker: Arc<dyn ImagePicker>,
        compressor: ImageCompressor,
        analyzer: Arc<dyn Analyzer>,
        share_target: Arc<dyn ShareTarget>,
        app_name: impl Into<String>,
        share_url: impl Into<String>,
    ) -> Self {
        Self {
            picker,
            compressor,
            analyzer,
            share_target,
            app_name: app_name.into(),
            share_url: share_url.into(),
            state: FlowState::Idle,
            selected: None,
            result: None,
            status_message: None,
            analyzing: false,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn screen(&self) -> Screen<'_> {
        match (self.state, &self.selected, &self.result) {
            (FlowState::Preview, Some(image), _) => Screen::Preview {
                image_uri: &image.uri,
                file_name: &image.name,
                analyzing: self.analyzing,
            },
            (FlowState::Result, Some(image), Some(result)) => Screen::Result {
                result,
                image_uri: &image.uri,
            },
            _ => Screen::Upload {
                status_message: self.status_message(),
            },
        }
    }

    /// Pick a photo from `source`, compress it and move to the preview
    ///
    /// A cancelled picker changes nothing. A refused permission only sets the
    /// status message. Any other failure drops back to idle.
    pub async fn pick_image(&mut self, source: ImageSource) {
        self.status_message = None;
        self.analyzing = false;

        match self.select_from(source).await {
            Ok(Some(image)) => {
                info!(name = %image.name, bytes = image.approx_bytes, "Image ready for analysis");
                if let Some(previous) = self.selected.replace(image) {
                    self.release_unless_current(previous).await;
                }
                self.result = None;
                self.state = FlowState::Preview;
            }
            Ok(None) => {}
            Err(PickFailure::PermissionDenied(message)) => {
                self.status_message = Some(message.to_string());
            }
            Err(PickFailure::Failed(message)) => {
                error!("Failed to process selected image: {}", message);
                self.release_selected().await;
                self.result = None;
                self.state = FlowState::Idle;
                self.status_message = Some(message);
            }
        }
    }

    async fn select_from(&self, source: ImageSource) -> Result<Option<SelectedImage>, PickFailure> {
        if let Some(denied) = source.permission_message() {
            if !self.picker.request_permission(source).await {
                return Err(PickFailure::PermissionDenied(denied));
            }
        }

        let asset = match self.picker.pick(source).await {
            Ok(PickOutcome::Picked(asset)) => asset,
            Ok(PickOutcome::Cancelled) => return Ok(None),
            Err(e) => return Err(PickFailure::Failed(non_empty_or_generic(e.to_string()))),
        };

        let prepared = self
            .compressor
            .prepare(&asset.uri)
            .await
            .map_err(|e| PickFailure::Failed(non_empty_or_generic(e.to_string())))?;

        let name = ensure_jpeg_name(Some(display_name(&asset, source)));
        Ok(Some(SelectedImage::from_prepared(prepared, name)))
    }

    /// Send the selected image to the relay and move to the result
    pub async fn analyze(&mut self) {
        let Some(data_url) = self.selected.as_ref().map(|image| image.data_url.clone()) else {
            return;
        };

        self.analyzing = true;

        match self.analyzer.analyze_image(&data_url).await {
            Ok(response) => {
                let description = response.first_content().unwrap_or(NO_RESPONSE).to_string();
                let is_hamburger = detect_hamburger(Some(&description));
                info!(description = %description, is_hamburger, "Analysis complete");
                self.result = Some(AnalysisResult {
                    description,
                    is_hamburger,
                });
                self.state = FlowState::Result;
            }
            Err(e) => {
                error!("Image analysis failed: {}", e);
                self.status_message = Some(e.to_string());
                self.state = FlowState::Idle;
                self.release_selected().await;
            }
        }

        self.analyzing = false;
    }

    /// Share the current result; failures are only logged
    pub async fn share(&self) {
        let Some(result) = &self.result else {
            return;
        };

        let message = share_message(result, &self.app_name, &self.share_url);
        if let Err(e) = self.share_target.share(&message).await {
            error!("{}", e);
        }
    }

    /// Back to the upload screen with nothing selected
    pub async fn reset(&mut self) {
        self.release_selected().await;
        self.result = None;
        self.state = FlowState::Idle;
        self.status_message = None;
        self.analyzing = false;
    }

    async fn release_selected(&mut self) {
        if let Some(image) = self.selected.take() {
            self.compressor.release(&image.uri).await;
        }
    }

    async fn release_unless_current(&self, previous: SelectedImage) {
        let current = self.selected.as_ref().map(|image| image.uri.as_str());
        if current != Some(previous.uri.as_str()) {
            self.compressor.release(&previous.uri).await;
        }
    }
}

fn display_name(asset: &PickedAsset, source: ImageSource) -> &str {
    match (&asset.name, source) {
        (Some(name), _) => name.as_str(),
        (None, ImageSource::Files) => asset.uri.as_str(),
        (None, _) => source.fallback_name(),
    }
}

fn non_empty_or_generic(message: String) -> String {
    if message.trim().is_empty() {
        GENERIC_PICK_FAILURE.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_jpeg_name() {
        assert_eq!(ensure_jpeg_name(None), "photo.jpg");
        assert_eq!(ensure_jpeg_name(Some("")), "photo.jpg");
        assert_eq!(ensure_jpeg_name(Some("IMG_0001.HEIC")), "IMG_0001.jpg");
        assert_eq!(ensure_jpeg_name(Some("archive.tar.gz")), "archive.tar.jpg");
        assert_eq!(ensure_jpeg_name(Some("camera")), "camera.jpg");
        assert_eq!(ensure_jpeg_name(Some(".png")), "photo.jpg");
        assert_eq!(ensure_jpeg_name(Some("trailing.")), "trailing..jpg");
        assert_eq!(ensure_jpeg_name(Some("dir.d/file")), "dir.d/file.jpg");
    }

    #[test]
    fn test_share_message() {
        let yes = AnalysisResult {
            description: "HAMBURGER".to_string(),
            is_hamburger: true,
        };
        assert_eq!(
            share_message(&yes, "Not Hamburger", "https://not.reyml.com"),
            "I ate a hamburger! ✅\n\nTry Not Hamburger: https://not.reyml.com"
        );

        let no = AnalysisResult {
            description: "NOT_HAMBURGER".to_string(),
            is_hamburger: false,
        };
        assert!(share_message(&no, "App", "url").starts_with("This is not a hamburger. ❌\n\n"));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let unnamed = PickedAsset {
            uri: "file:///tmp/x.png".to_string(),
            name: None,
        };
        assert_eq!(display_name(&unnamed, ImageSource::Files), "file:///tmp/x.png");
        assert_eq!(display_name(&unnamed, ImageSource::Camera), "camera");
        assert_eq!(display_name(&unnamed, ImageSource::Library), "photo");

        let named = PickedAsset {
            uri: "file:///tmp/x.png".to_string(),
            name: Some("burger.png".to_string()),
        };
        assert_eq!(display_name(&named, ImageSource::Camera), "burger.png");
    }
}

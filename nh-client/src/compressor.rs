//! Client-side image compression
//!
//! Uploads must fit a byte budget. The compressor walks a fixed grid of
//! (width, quality) pairs, widest first and best quality first within a
//! width, and returns the first re-encode whose payload fits. Each step
//! re-encodes the previous step's output rather than the original, so the
//! image is downscaled progressively.

use async_trait::async_trait;
use nh_common::data_url::{to_data_url, JPEG_MIME};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Upload budget in decoded bytes
pub const MAX_UPLOAD_BYTES: usize = 6_500_000;

/// Target widths in pixels, tried in order
pub const WIDTH_STEPS: [u32; 11] = [1400, 1200, 1080, 960, 820, 720, 640, 560, 480, 400, 360];

/// JPEG quality factors (0.0 - 1.0), tried in order at each width
pub const QUALITY_STEPS: [f32; 8] = [0.72, 0.60, 0.48, 0.38, 0.30, 0.24, 0.20, 0.18];

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("Image is too large even after compression. Please choose a smaller photo.")]
    TooLarge,

    #[error("We could not process that image: {0}")]
    Manipulation(String),
}

/// Output of one resize/re-encode step
#[derive(Debug, Clone, Default)]
pub struct Reencoded {
    /// Reference to the re-encoded image, if the platform produced one
    pub uri: Option<String>,
    /// Base64 JPEG payload, if the platform produced one
    pub base64: Option<String>,
}

/// Platform resize/re-encode primitive
#[async_trait]
pub trait ImageManipulator: Send + Sync {
    /// Resize the image at `uri` to `width` pixels wide and re-encode it as
    /// JPEG at `quality` (0.0 - 1.0)
    async fn resize_and_encode(
        &self,
        uri: &str,
        width: u32,
        quality: f32,
    ) -> Result<Reencoded, CompressError>;

    /// Release a candidate produced by this manipulator; other uris are ignored
    async fn discard(&self, _uri: &str) {}
}

/// Size-bounded image ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub data_url: String,
    pub mime_type: String,
    pub approx_bytes: usize,
    pub uri: String,
}

/// Decoded size of a base64 payload
///
/// Whitespace is ignored. `floor(len * 3 / 4)` minus one byte per trailing
/// `=` (at most two).
pub fn estimate_decoded_bytes(base64: &str) -> usize {
    let cleaned: String = base64.chars().filter(|c| !c.is_whitespace()).collect();
    let padding = if cleaned.ends_with("==") {
        2
    } else if cleaned.ends_with('=') {
        1
    } else {
        0
    };
    (cleaned.len() * 3 / 4).saturating_sub(padding)
}

/// Budget-driven search over [`WIDTH_STEPS`] × [`QUALITY_STEPS`]
#[derive(Clone)]
pub struct ImageCompressor {
    manipulator: Arc<dyn ImageManipulator>,
    max_bytes: usize,
}

impl ImageCompressor {
    pub fn new(manipulator: Arc<dyn ImageManipulator>) -> Self {
        Self::with_budget(manipulator, MAX_UPLOAD_BYTES)
    }

    pub fn with_budget(manipulator: Arc<dyn ImageManipulator>, max_bytes: usize) -> Self {
        Self {
            manipulator,
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Produce the first candidate that fits the budget
    ///
    /// Every intermediate candidate is discarded; only the returned one is kept.
    pub async fn prepare(&self, uri: &str) -> Result<PreparedImage, CompressError> {
        let mut working_uri = uri.to_string();
        let result = self.search(uri, &mut working_uri).await;

        let kept = result.as_ref().ok().map(|prepared| prepared.uri.as_str());
        if working_uri != uri && kept != Some(working_uri.as_str()) {
            self.manipulator.discard(&working_uri).await;
        }

        result
    }

    /// Release an image returned by [`prepare`](Self::prepare)
    pub async fn release(&self, uri: &str) {
        self.manipulator.discard(uri).await;
    }

    async fn search(&self, source: &str, working_uri: &mut String) -> Result<PreparedImage, CompressError> {
        for width in WIDTH_STEPS {
            for quality in QUALITY_STEPS {
                let candidate = self
                    .manipulator
                    .resize_and_encode(working_uri, width, quality)
                    .await?;

                let Some(base64) = candidate.base64 else {
                    debug!(width, quality, "Re-encode produced no payload, skipping");
                    if let Some(skipped) = candidate.uri.filter(|u| u.as_str() != working_uri.as_str() && u.as_str() != source) {
                        self.manipulator.discard(&skipped).await;
                    }
                    continue;
                };

                let approx_bytes = estimate_decoded_bytes(&base64);
                debug!(width, quality, approx_bytes, budget = self.max_bytes, "Compression candidate");

                if approx_bytes <= self.max_bytes {
                    return Ok(PreparedImage {
                        data_url: to_data_url(JPEG_MIME, &base64),
                        mime_type: JPEG_MIME.to_string(),
                        approx_bytes,
                        uri: candidate.uri.unwrap_or_else(|| working_uri.clone()),
                    });
                }

                if let Some(next) = candidate.uri {
                    if working_uri.as_str() != source && *working_uri != next {
                        self.manipulator.discard(working_uri.as_str()).await;
                    }
                    *working_uri = next;
                }
            }
        }

        Err(CompressError::TooLarge)
    }
}

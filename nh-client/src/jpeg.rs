//! Native resize/re-encode primitive built on the `image` crate
//!
//! Candidates are written to a scratch directory owned by the manipulator.
//! Rejected candidates are deleted as the search moves on; dropping the
//! manipulator removes whatever is left.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tracing::debug;

use crate::compressor::{CompressError, ImageManipulator, Reencoded};

pub struct JpegManipulator {
    scratch: TempDir,
    counter: AtomicUsize,
}

impl JpegManipulator {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            scratch: tempfile::Builder::new().prefix("nh-client-").tempdir()?,
            counter: AtomicUsize::new(0),
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    fn next_output_path(&self) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.scratch.path().join(format!("candidate-{:03}.jpg", n))
    }
}

#[async_trait]
impl ImageManipulator for JpegManipulator {
    async fn resize_and_encode(
        &self,
        uri: &str,
        width: u32,
        quality: f32,
    ) -> Result<Reencoded, CompressError> {
        let source = path_from_uri(uri);
        let output = self.next_output_path();
        let target = output.clone();

        let base64 = tokio::task::spawn_blocking(move || reencode_file(&source, &target, width, quality))
            .await
            .map_err(|e| CompressError::Manipulation(e.to_string()))??;

        Ok(Reencoded {
            uri: Some(output.to_string_lossy().into_owned()),
            base64: Some(base64),
        })
    }

    async fn discard(&self, uri: &str) {
        let path = path_from_uri(uri);
        if !path.starts_with(self.scratch.path()) {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(&path).await {
            debug!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Accept plain paths and `file://` URIs
pub fn path_from_uri(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

/// JPEG quality percentage for a 0.0 - 1.0 factor
pub fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Downsize to `width` keeping the aspect ratio; narrower images are left alone
pub fn fit_to_width(img: DynamicImage, width: u32) -> DynamicImage {
    if img.width() <= width {
        return img;
    }
    let height = ((img.height() as u64 * width as u64) / img.width() as u64).max(1) as u32;
    img.resize_exact(width, height, FilterType::Lanczos3)
}

/// Encode as baseline JPEG; alpha is dropped
pub fn encode_jpeg(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, CompressError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality_percent(quality))
        .encode_image(&rgb)
        .map_err(|e| CompressError::Manipulation(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

fn reencode_file(source: &Path, output: &Path, width: u32, quality: f32) -> Result<String, CompressError> {
    let bytes = std::fs::read(source)
        .map_err(|e| CompressError::Manipulation(format!("{}: {}", source.display(), e)))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| CompressError::Manipulation(format!("Image decode error: {}", e)))?;

    let encoded = encode_jpeg(&fit_to_width(img, width), quality)?;
    std::fs::write(output, &encoded)
        .map_err(|e| CompressError::Manipulation(format!("{}: {}", output.display(), e)))?;

    Ok(general_purpose::STANDARD.encode(&encoded))
}

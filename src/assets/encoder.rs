//! Image encoding for uploaded assets
//!
//! Uploads are downsized and re-encoded before they are stored in the
//! document. The result is an opaque [`AssetRef`]; nothing downstream parses
//! it.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reference to an encoded asset, stored verbatim in the document
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Size and quality bounds for one encode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeLimits {
    /// Longest side of the output, in pixels
    pub max_dimension: u32,

    /// JPEG quality, 1-100
    pub quality: u8,
}

impl Default for EncodeLimits {
    fn default() -> Self {
        Self {
            max_dimension: 1200,
            quality: 80,
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Upload is empty")]
    Empty,

    #[error("Encoder task failed: {0}")]
    Task(String),
}

/// Turns raw upload bytes into an asset reference
#[async_trait]
pub trait ImageEncoder: Send + Sync {
    async fn encode(&self, bytes: Vec<u8>, limits: EncodeLimits) -> Result<AssetRef, EncodeError>;
}

/// Encoder producing `data:image/jpeg;base64,...` references
#[derive(Clone, Copy, Debug, Default)]
pub struct DataUrlEncoder;

#[async_trait]
impl ImageEncoder for DataUrlEncoder {
    async fn encode(&self, bytes: Vec<u8>, limits: EncodeLimits) -> Result<AssetRef, EncodeError> {
        tokio::task::spawn_blocking(move || encode_data_url(&bytes, limits))
            .await
            .map_err(|e| EncodeError::Task(e.to_string()))?
    }
}

/// Downsize `bytes` to fit `limits` and encode them as a JPEG data URL
pub fn encode_data_url(bytes: &[u8], limits: EncodeLimits) -> Result<AssetRef, EncodeError> {
    if bytes.is_empty() {
        return Err(EncodeError::Empty);
    }

    let image = image::load_from_memory(bytes)?;
    let image = fit_within(image, limits.max_dimension.max(1));
    let rgb = image.to_rgb8();

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, limits.quality.clamp(1, 100));
    encoder.encode_image(&rgb)?;

    Ok(AssetRef(format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg))))
}

/// Shrink so the longest side is at most `max`, keeping the aspect ratio.
/// Smaller images are left as they are.
fn fit_within(image: DynamicImage, max: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= max && height <= max {
        return image;
    }
    image.resize(max, max, FilterType::Triangle)
}

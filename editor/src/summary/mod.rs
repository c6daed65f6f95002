//! Visual summary precomputation.
//!
//! Every dropped image is decoded once, reduced to a small BlurHash
//! string and a tiny PNG placeholder. Both are available immediately,
//! while the full image is still uploading.
//!
//! ```text
//! bytes ──▶ decode ──▶ downscale (≤ thumbnail_size) ──┬──▶ BlurHash
//!                                                     └──▶ PNG data URI
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::config::EditorConfig;
use crate::error::{SummaryError, SummaryResult};

/// Lightweight preview data of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualSummary {
    /// BlurHash of the image.
    pub hash: String,
    /// Width of the original image.
    pub width: u32,
    /// Height of the original image.
    pub height: u32,
    /// `data:image/png;base64,...` placeholder.
    pub thumbnail: String,
}

/// Computes [`VisualSummary`] values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summarizer {
    components_x: u32,
    components_y: u32,
    thumbnail_size: u32,
}

impl Default for Summarizer {
    fn default() -> Self {
        Self {
            components_x: crate::config::DEFAULT_HASH_COMPONENTS_X,
            components_y: crate::config::DEFAULT_HASH_COMPONENTS_Y,
            thumbnail_size: crate::config::DEFAULT_THUMBNAIL_SIZE,
        }
    }
}

impl Summarizer {
    pub fn new(components_x: u32, components_y: u32, thumbnail_size: u32) -> SummaryResult<Self> {
        if !(1..=9).contains(&components_x) || !(1..=9).contains(&components_y) {
            return Err(SummaryError::InvalidComponents {
                x: components_x,
                y: components_y,
            });
        }
        Ok(Self {
            components_x,
            components_y,
            thumbnail_size: thumbnail_size.max(1),
        })
    }

    pub fn from_config(config: &EditorConfig) -> SummaryResult<Self> {
        Self::new(
            config.hash_components_x,
            config.hash_components_y,
            config.thumbnail_size,
        )
    }

    /// Decode `bytes` and summarise them.
    pub fn summarize(&self, bytes: &[u8]) -> SummaryResult<VisualSummary> {
        let format = image::guess_format(bytes)
            .map_err(|e| SummaryError::UnsupportedFormat(e.to_string()))?;
        let img = image::load_from_memory_with_format(bytes, format)?;
        self.summarize_image(&img)
    }

    pub fn summarize_image(&self, img: &DynamicImage) -> SummaryResult<VisualSummary> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(SummaryError::EmptyImage);
        }

        let small = if width > self.thumbnail_size || height > self.thumbnail_size {
            img.thumbnail(self.thumbnail_size, self.thumbnail_size)
        } else {
            img.clone()
        };
        let rgba = small.to_rgba8();

        let hash = encode_blurhash(
            self.components_x,
            self.components_y,
            rgba.width(),
            rgba.height(),
            rgba.as_raw(),
        )?;

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(rgba).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        let thumbnail = format!("data:image/png;base64,{}", STANDARD.encode(&png));

        log::debug!("Summarised {}x{} image: {}", width, height, hash);

        Ok(VisualSummary {
            hash,
            width,
            height,
            thumbnail,
        })
    }
}

// =============================================================================
// BlurHash
// =============================================================================

/// Encode RGBA pixels as a BlurHash string.
///
/// Output length is `6 + 2 * (components_x * components_y - 1)`.
pub fn encode_blurhash(
    components_x: u32,
    components_y: u32,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> SummaryResult<String> {
    if !(1..=9).contains(&components_x) || !(1..=9).contains(&components_y) {
        return Err(SummaryError::InvalidComponents {
            x: components_x,
            y: components_y,
        });
    }
    let pixels = width as usize * height as usize;
    if pixels == 0 {
        return Err(SummaryError::EmptyImage);
    }
    let expected = pixels * 4;
    if rgba.len() != expected {
        return Err(SummaryError::BufferSize {
            expected,
            actual: rgba.len(),
        });
    }

    blurhash::encode(components_x, components_y, width, height, rgba)
        .map_err(|e| SummaryError::Hash(e.to_string()))
}

/// Solid-colour PNG for tests across the crate.
#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

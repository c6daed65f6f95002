//! Common types used across the frontend application.
//!
//! # Categories
//!
//! - **Tile Types** - per-image view state
//! - **Error Types** - Frontend error handling

use crate::config::image_url;
use imgdrop::{DisplayRef, EntryKey, EntryProgress, ImageEntry};
use std::fmt;

// =============================================================================
// Tile Types
// =============================================================================

/// Everything a thumbnail tile needs to render.
#[derive(Clone, Debug, PartialEq)]
pub struct TileView {
    pub key: EntryKey,
    pub name: String,
    /// Object URL while uploading, served image afterwards.
    pub src: String,
    /// Blurhash data URI shown under the image.
    pub placeholder: String,
    pub width: u32,
    pub height: u32,
    pub primary: bool,
    pub has_meta: bool,
    pub progress: EntryProgress,
}

impl TileView {
    pub fn new(entry: &ImageEntry, primary: bool, progress: EntryProgress) -> Self {
        let src = match entry.display_ref() {
            DisplayRef::Local(local) => local.uri().to_string(),
            DisplayRef::Persisted(id) => image_url(&id),
        };
        Self {
            key: entry.key(),
            name: entry.name.clone(),
            src,
            placeholder: entry.summary.thumbnail.clone(),
            width: entry.summary.width,
            height: entry.summary.height,
            primary,
            has_meta: entry.has_meta(),
            progress,
        }
    }

    /// `stroke-dashoffset` of the progress ring for a circle of radius `r`.
    pub fn ring_offset(&self, r: f64) -> f64 {
        let circumference = 2.0 * std::f64::consts::PI * r;
        circumference * (1.0 - f64::from(self.progress.percent()) / 100.0)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Frontend application errors.
#[derive(Clone, Debug, PartialEq)]
pub enum AppError {
    /// File could not be read or summarized.
    File(String),
    /// Upload was rejected by the server.
    Upload(String),
    /// Network/HTTP error.
    Network(String),
    /// Response did not contain an image id.
    InvalidResponse(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::File(msg) => write!(f, "File error: {}", msg),
            AppError::Upload(msg) => write!(f, "Upload error: {}", msg),
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for frontend operations.
pub type AppResult<T> = Result<T, AppError>;

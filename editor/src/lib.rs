//! # imgdrop - ordered image collection editor
//!
//! Keeps an ordered, bounded list of images attached to a post while their
//! uploads run in the background. Entries can be reordered by drag and
//! drop, annotated with generation metadata, or removed at any time.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Dropped     │────▶│  Summarizer │────▶│ Collection  │────▶│  onChange   │
//! │ files       │     │ (blurhash)  │     │ (ordered)   │     │  listener   │
//! └─────────────┘     └─────────────┘     └──────▲──────┘     └─────────────┘
//!                                                │ complete_upload(file id)
//!                     ┌─────────────┐     ┌──────┴──────┐
//!                     │  Uploader   │────▶│ UploadEvent │
//!                     │ (HTTP, bg)  │     │  channel    │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use imgdrop::{DroppedFile, EditorConfig, HttpUploader, ImageUploadEditor, UploadConfig};
//!
//! #[tokio::main]
//! async fn main() -> imgdrop::EditorResult<()> {
//!     let uploader = HttpUploader::new(UploadConfig::from_env()?);
//!     let mut editor = ImageUploadEditor::new(&EditorConfig::default(), Arc::new(uploader))?;
//!     editor.insert(vec![DroppedFile::new("cat.png", std::fs::read("cat.png")?)]);
//!     editor.settle().await;
//!     println!("{}", serde_json::to_string_pretty(&editor.persisted())?);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Editor and upload settings
//! - [`models`] - Entries, file handles, display references
//! - [`meta`] - Generation metadata and its edit form
//! - [`summary`] - Blurhash and thumbnail computation
//! - [`collection`] - The ordered, bounded list
//! - [`drag`] - Drag-to-reorder state machine
//! - [`progress`] - Upload progress side table
//! - [`upload`] - Uploader trait and HTTP client
//! - `editor` - Async session tying it all together (`runtime` feature)

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Annotations and summaries
pub mod meta;
pub mod summary;

// List state
pub mod collection;
pub mod drag;
pub mod progress;

// Uploads
pub mod upload;

// Session
#[cfg(feature = "runtime")]
pub mod editor;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ConfigResult, EditorError, EditorResult, SummaryError, SummaryResult,
    UploadError, UploadResult,
};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::{EditorConfig, UploadConfig, DEFAULT_MAX_IMAGES};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    DisplayRef, EntryKey, FileHandle, FileId, ImageEntry, LocalRef, PersistedImage,
    UploadState,
};

pub use meta::{parse_meta_pairs, ImageMeta, MetaForm, MAX_CFG_SCALE, SAMPLERS};

pub use summary::{encode_blurhash, Summarizer, VisualSummary};

// =============================================================================
// Re-exports - List state
// =============================================================================

pub use collection::ImageCollection;

pub use drag::{closest_center, DragController, DragState, Point, Rect, ACTIVATION_DISTANCE};

pub use progress::{EntryProgress, ProgressTable, UploadStatus};

// =============================================================================
// Re-exports - Uploads
// =============================================================================

pub use upload::{extract_remote_id, DisabledUploader, ProgressReporter, UploadEvent, Uploader};

#[cfg(feature = "runtime")]
pub use upload::HttpUploader;

#[cfg(feature = "runtime")]
pub use editor::{DroppedFile, ImageUploadEditor};

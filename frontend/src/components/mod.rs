//! UI components for the image editor.
//!
//! # Feature Components
//! - [`ImageUpload`] - Image collection with drag & drop and background uploads
//! - [`ImageMetaPopover`] - Generation metadata form
//!
//! # Pages
//! - [`EditPostPage`] - Post edit page hosting the widget

mod edit_post;
mod image_upload;
mod meta_popover;

pub use edit_post::*;
pub use image_upload::*;
pub use meta_popover::*;

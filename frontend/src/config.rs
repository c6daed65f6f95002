//! Application configuration.
//!
//! Compile-time settings for the image editor front end.

/// Backend API base URL.
pub const BACKEND_URL: &str = "http://localhost:3000";

/// Upload endpoint, relative to [`BACKEND_URL`].
///
/// Answers `{ "id": "..." }` for a multipart `file` field.
pub const UPLOAD_PATH: &str = "/api/images";

/// Maximum number of images attached to a post.
pub const MAX_IMAGES: usize = imgdrop::DEFAULT_MAX_IMAGES;

/// Maximum file size for upload (in bytes).
///
/// 20 MB limit.
pub const MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

/// `accept` attribute of the file picker.
pub const ACCEPTED_TYPES: &str = "image/png,image/jpeg,image/gif,image/webp";

/// URL of an uploaded image.
pub fn image_url(remote_id: &str) -> String {
    format!("{}{}/{}", BACKEND_URL, UPLOAD_PATH, remote_id)
}

//! Error types for the image collection editor.
//!
//! - [`SummaryError`] - Image decoding / visual summary errors
//! - [`UploadError`] - Upload collaborator errors
//! - [`ConfigError`] - Configuration loading errors
//! - [`EditorError`] - Top-level errors for editor sessions and the CLI
//!
//! Editing operations themselves never fail: unknown keys are no-ops.
//! Errors only come from the collaborators (decoder, uploader, environment).

use thiserror::Error;

// =============================================================================
// Visual Summary Errors
// =============================================================================

/// Errors while computing the visual summary of an image.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// The bytes are not a recognised image format.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Decoding or re-encoding failed.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// The decoded image has no pixels.
    #[error("Image is empty")]
    EmptyImage,

    /// Invalid number of hash components.
    #[error("Hash components must be within 1..=9, got {x}x{y}")]
    InvalidComponents { x: u32, y: u32 },

    /// The pixel buffer does not match the given dimensions.
    #[error("Expected {expected} RGBA bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// The BlurHash encoder rejected the input.
    #[error("BlurHash encoding failed: {0}")]
    Hash(String),
}

// =============================================================================
// Upload Errors
// =============================================================================

/// Errors reported by an upload collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UploadError {
    /// The request could not be sent or the connection failed.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The server answer could not be understood.
    #[error("Invalid upload response: {0}")]
    InvalidResponse(String),

    /// No upload endpoint is configured.
    #[error("No upload endpoint configured")]
    MissingEndpoint,
}

impl UploadError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            UploadError::Request(_) => true,
            UploadError::Server { status, .. } => *status == 429 || *status >= 500,
            UploadError::InvalidResponse(_) | UploadError::MissingEndpoint => false,
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingVar(String),

    /// A value could not be parsed.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

// =============================================================================
// Editor Errors (top-level)
// =============================================================================

/// Top-level error for editor sessions and the command line tool.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Visual summary error.
    #[error("Summary error: {0}")]
    Summary(#[from] SummaryError),

    /// Upload error.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Some uploads did not complete.
    #[error("{0} upload(s) failed")]
    UploadsFailed(usize),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for visual summary operations.
pub type SummaryResult<T> = Result<T, SummaryError>;

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for editor sessions.
pub type EditorResult<T> = Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let upload_err = UploadError::MissingEndpoint;
        let editor_err: EditorError = upload_err.into();
        assert!(editor_err.to_string().contains("endpoint"));

        let config_err = ConfigError::MissingVar("IMGDROP_UPLOAD_URL".into());
        let editor_err: EditorError = config_err.into();
        assert!(editor_err.to_string().contains("IMGDROP_UPLOAD_URL"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(UploadError::Request("reset".into()).is_transient());
        assert!(UploadError::Server { status: 503, message: "busy".into() }.is_transient());
        assert!(UploadError::Server { status: 429, message: "slow down".into() }.is_transient());
        assert!(!UploadError::Server { status: 400, message: "bad".into() }.is_transient());
        assert!(!UploadError::InvalidResponse("no id".into()).is_transient());
    }

    #[test]
    fn test_server_error_format() {
        let err = UploadError::Server { status: 413, message: "too large".into() };
        let msg = err.to_string();
        assert!(msg.contains("413"));
        assert!(msg.contains("too large"));
    }
}

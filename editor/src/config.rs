//! Editor and upload configuration.
//!
//! [`EditorConfig`] holds the collection limits and visual summary
//! parameters. [`UploadConfig`] describes the upload endpoint and is
//! usually loaded from the environment (`.env` supported).

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default maximum number of images in a collection.
pub const DEFAULT_MAX_IMAGES: usize = 10;

/// Default horizontal BlurHash components.
pub const DEFAULT_HASH_COMPONENTS_X: u32 = 4;

/// Default vertical BlurHash components.
pub const DEFAULT_HASH_COMPONENTS_Y: u32 = 3;

/// Default edge length (pixels) of the placeholder thumbnail.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 32;

/// Default number of upload attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay between upload attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Environment variable holding the upload endpoint.
pub const ENV_UPLOAD_URL: &str = "IMGDROP_UPLOAD_URL";

/// Environment variable holding the optional bearer token.
pub const ENV_API_TOKEN: &str = "IMGDROP_API_TOKEN";

/// Collection editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of entries in the collection.
    pub max_images: usize,

    /// Whether the first entry is the primary (featured) image.
    pub primary_image: bool,

    /// Horizontal BlurHash components (1..=9).
    pub hash_components_x: u32,

    /// Vertical BlurHash components (1..=9).
    pub hash_components_y: u32,

    /// Longest edge of the placeholder thumbnail.
    pub thumbnail_size: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_images: DEFAULT_MAX_IMAGES,
            primary_image: false,
            hash_components_x: DEFAULT_HASH_COMPONENTS_X,
            hash_components_y: DEFAULT_HASH_COMPONENTS_Y,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
        }
    }
}

impl EditorConfig {
    /// Set the maximum number of images.
    pub fn with_max_images(mut self, max: usize) -> Self {
        self.max_images = max;
        self
    }

    /// Enable or disable primary image mode.
    pub fn with_primary_image(mut self, primary: bool) -> Self {
        self.primary_image = primary;
        self
    }
}

/// Upload endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    /// URL receiving multipart uploads.
    pub endpoint: String,

    /// Optional bearer token.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Total attempts per file (including the first one).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

impl UploadConfig {
    /// Create a config for an endpoint with default retry settings.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_token: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }

    /// Load from `IMGDROP_UPLOAD_URL` / `IMGDROP_API_TOKEN`.
    #[cfg(feature = "runtime")]
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();

        let endpoint = std::env::var(ENV_UPLOAD_URL)
            .map_err(|_| ConfigError::MissingVar(ENV_UPLOAD_URL.to_string()))?;
        let api_token = std::env::var(ENV_API_TOKEN).ok().filter(|t| !t.is_empty());

        Self::new(endpoint).with_token(api_token).validated()
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.api_token = token;
        self
    }

    /// Set the retry policy.
    pub fn with_retries(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Check that the endpoint looks like an HTTP(S) URL.
    pub fn validated(self) -> ConfigResult<Self> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "endpoint".to_string(),
                message: format!("expected an http(s) URL, got '{}'", self.endpoint),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.max_images, 10);
        assert!(!config.primary_image);
        assert_eq!((config.hash_components_x, config.hash_components_y), (4, 3));
    }

    #[test]
    fn test_partial_config_deserialization() {
        let config: EditorConfig =
            serde_json::from_str(r#"{ "maxImages": 4, "primaryImage": true }"#).unwrap();
        assert_eq!(config.max_images, 4);
        assert!(config.primary_image);
        assert_eq!(config.thumbnail_size, DEFAULT_THUMBNAIL_SIZE);
    }

    #[test]
    fn test_upload_config_validation() {
        assert!(UploadConfig::new("https://images.example.com/upload").validated().is_ok());
        let err = UploadConfig::new("ftp://nope").validated().unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_retries_never_zero() {
        let config = UploadConfig::new("http://localhost").with_retries(0, 10);
        assert_eq!(config.max_retries, 1);
    }
}

//! HTTP multipart uploader.
//!
//! Posts the file as a `file` multipart field, streaming the body in
//! chunks so progress can be reported while it is sent. The service
//! answers with `{ "id": "..." }` (or `{ "result": { "id": "..." } }`).

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde_json::Value;
use std::time::Duration;

use super::{extract_remote_id, ProgressReporter, Uploader};
use crate::config::UploadConfig;
use crate::error::{UploadError, UploadResult};
use crate::models::FileHandle;

/// Body chunk size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Uploads files to an HTTP endpoint.
#[derive(Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
    config: UploadConfig,
}

impl HttpUploader {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Single attempt.
    async fn try_upload(&self, file: &FileHandle, progress: &ProgressReporter) -> UploadResult<String> {
        let bytes = file.shared_bytes();
        let total = bytes.len();
        let mime = image::guess_format(&bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");

        let reporter = progress.clone();
        reporter.report(0);
        let chunks = futures::stream::iter((0..total).step_by(CHUNK_SIZE).map(move |start| {
            let end = (start + CHUNK_SIZE).min(total);
            reporter.report_bytes(end, total);
            Ok::<_, std::io::Error>(bytes[start..end].to_vec())
        }));

        let part = Part::stream_with_length(Body::wrap_stream(chunks), total as u64)
            .file_name(file.name().to_string())
            .mime_str(mime)
            .map_err(|e| UploadError::Request(format!("Failed to build request: {}", e)))?;
        let form = Form::new().part("file", part);

        let mut request = self.client.post(&self.config.endpoint).multipart(form);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UploadError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UploadError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;

        extract_remote_id(&body)
            .ok_or_else(|| UploadError::InvalidResponse(format!("no id in response: {}", body)))
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, file: FileHandle, progress: ProgressReporter) -> UploadResult<String> {
        let attempts = self.config.max_retries.max(1);
        let mut attempt = 1;

        loop {
            match self.try_upload(&file, &progress).await {
                Ok(id) => {
                    log::info!("Uploaded {} as {}", file.name(), id);
                    return Ok(id);
                }
                Err(e) if e.is_transient() && attempt < attempts => {
                    log::warn!(
                        "Upload of {} failed (attempt {}/{}): {}",
                        file.name(),
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("Upload of {} failed: {}", file.name(), e);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::test_png;
    use crate::upload::UploadEvent;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_upload_success_reports_full_progress() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .match_header("authorization", "Bearer secret")
            .match_body(mockito::Matcher::Regex(r#"filename="red.png""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"img-42"}"#)
            .create_async()
            .await;

        let config = UploadConfig::new(format!("{}/upload", server.url()))
            .with_token(Some("secret".into()));
        let uploader = HttpUploader::new(config);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let file = FileHandle::new("red.png", test_png(8, 8, [255, 0, 0]));
        let reporter = ProgressReporter::new(file.id(), move |e| sink.lock().unwrap().push(e));

        let id = uploader.upload(file.clone(), reporter).await.unwrap();

        assert_eq!(id, "img-42");
        mock.assert_async().await;
        let last = events.lock().unwrap().last().cloned();
        assert_eq!(last, Some(UploadEvent::Progress { file: file.id(), percent: 100 }));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .with_status(400)
            .with_body("bad file")
            .expect(1)
            .create_async()
            .await;

        let config = UploadConfig::new(format!("{}/upload", server.url())).with_retries(3, 0);
        let file = FileHandle::new("a.png", test_png(2, 2, [0, 0, 0]));
        let err = HttpUploader::new(config)
            .upload(file.clone(), ProgressReporter::noop(file.id()))
            .await
            .unwrap_err();

        assert_eq!(err, UploadError::Server { status: 400, message: "bad file".into() });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let config = UploadConfig::new(format!("{}/upload", server.url())).with_retries(2, 0);
        let file = FileHandle::new("a.png", test_png(2, 2, [0, 0, 0]));
        let err = HttpUploader::new(config)
            .upload(file.clone(), ProgressReporter::noop(file.id()))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Server { status: 503, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_id_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let config = UploadConfig::new(format!("{}/upload", server.url()));
        let file = FileHandle::new("a.png", test_png(2, 2, [0, 0, 0]));
        let err = HttpUploader::new(config)
            .upload(file.clone(), ProgressReporter::noop(file.id()))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::InvalidResponse(_)));
    }
}

//! Upload collaborator.
//!
//! An [`Uploader`] turns a [`FileHandle`] into a persisted identifier and
//! reports progress through a [`ProgressReporter`]. Results come back to
//! the editor as [`UploadEvent`]s, keyed by [`FileId`].

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{UploadError, UploadResult};
use crate::models::{FileHandle, FileId};

#[cfg(feature = "runtime")]
mod http;

#[cfg(feature = "runtime")]
pub use http::HttpUploader;

/// Outcome notifications produced by upload tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Progress { file: FileId, percent: u8 },
    Completed { file: FileId, remote_id: String },
    Failed { file: FileId, error: UploadError },
}

impl UploadEvent {
    pub fn file(&self) -> FileId {
        match self {
            UploadEvent::Progress { file, .. }
            | UploadEvent::Completed { file, .. }
            | UploadEvent::Failed { file, .. } => *file,
        }
    }
}

type EventSink = Arc<dyn Fn(UploadEvent) + Send + Sync>;

/// Reports progress of one file.
#[derive(Clone)]
pub struct ProgressReporter {
    file: FileId,
    sink: EventSink,
}

impl ProgressReporter {
    pub fn new<F>(file: FileId, sink: F) -> Self
    where
        F: Fn(UploadEvent) + Send + Sync + 'static,
    {
        Self {
            file,
            sink: Arc::new(sink),
        }
    }

    /// A reporter that discards everything.
    pub fn noop(file: FileId) -> Self {
        Self::new(file, |_| {})
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn report(&self, percent: u8) {
        (self.sink)(UploadEvent::Progress {
            file: self.file,
            percent: percent.min(100),
        });
    }

    /// Report `sent` out of `total` bytes.
    pub fn report_bytes(&self, sent: usize, total: usize) {
        self.report(percent_of(sent, total));
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter").field("file", &self.file).finish()
    }
}

fn percent_of(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) as u128 * 100) / total as u128) as u8
}

/// Read the persisted identifier from an upload response.
pub fn extract_remote_id(body: &Value) -> Option<String> {
    body.get("id")
        .or_else(|| body.get("result").and_then(|r| r.get("id")))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Sends files to the upload service.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `file`, returning its persisted identifier.
    async fn upload(&self, file: FileHandle, progress: ProgressReporter) -> UploadResult<String>;
}

/// Uploader used when no endpoint is configured: every upload fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledUploader;

#[async_trait]
impl Uploader for DisabledUploader {
    async fn upload(&self, _file: FileHandle, _progress: ProgressReporter) -> UploadResult<String> {
        Err(UploadError::MissingEndpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_extract_remote_id() {
        assert_eq!(extract_remote_id(&json!({ "id": "abc" })), Some("abc".into()));
        assert_eq!(
            extract_remote_id(&json!({ "success": true, "result": { "id": "cf-1" } })),
            Some("cf-1".into())
        );
        assert_eq!(extract_remote_id(&json!({ "id": "" })), None);
        assert_eq!(extract_remote_id(&json!({ "url": "x" })), None);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 200), 0);
        assert_eq!(percent_of(50, 200), 25);
        assert_eq!(percent_of(300, 200), 100);
        assert_eq!(percent_of(0, 0), 100);
    }

    #[test]
    fn test_reporter_tags_events_with_file() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let file = FileId::new();
        let reporter = ProgressReporter::new(file, move |event| sink.lock().unwrap().push(event));

        reporter.report_bytes(1, 4);
        reporter.report(130);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                UploadEvent::Progress { file, percent: 25 },
                UploadEvent::Progress { file, percent: 100 },
            ]
        );
        assert!(seen.iter().all(|e| e.file() == file));
    }

    #[tokio::test]
    async fn test_disabled_uploader_always_fails() {
        let file = FileHandle::new("a.png", vec![0u8; 4]);
        let err = DisabledUploader
            .upload(file.clone(), ProgressReporter::noop(file.id()))
            .await
            .unwrap_err();

        assert_eq!(err, UploadError::MissingEndpoint);
        assert!(!err.is_transient());
    }
}

//! Domain models for the image collection editor.
//!
//! - [`EntryKey`] - Stable identity of an entry in the collection
//! - [`FileHandle`] - The original, not yet uploaded file
//! - [`LocalRef`] - Transient local reference with scoped release
//! - [`UploadState`] - Pending (local) or uploaded (persisted)
//! - [`ImageEntry`] - One image in the ordered collection
//! - [`PersistedImage`] - Serialisable view of an uploaded entry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::meta::ImageMeta;
use crate::summary::VisualSummary;

// =============================================================================
// Identifiers
// =============================================================================

/// Stable identifier of an entry.
///
/// Assigned once at creation and never regenerated, so it survives
/// reorders, edits and upload completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryKey(Uuid);

impl EntryKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a dropped file, used to correlate upload results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Files and local references
// =============================================================================

/// Handle to an original file that has not been uploaded yet.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Clone)]
pub struct FileHandle {
    id: FileId,
    name: String,
    bytes: Arc<[u8]>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: FileId::new(),
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle on the file content.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

type ReleaseHook = Box<dyn Fn(&str) + Send + Sync>;

struct LocalRefInner {
    uri: String,
    release: Option<ReleaseHook>,
}

impl Drop for LocalRefInner {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(&self.uri);
        }
    }
}

/// Transient reference to locally held image bytes.
///
/// The release hook runs once, when the last clone is dropped. In the
/// browser this revokes the object URL.
#[derive(Clone)]
pub struct LocalRef {
    inner: Arc<LocalRefInner>,
}

impl LocalRef {
    /// A `local://` reference with nothing to release.
    pub fn detached() -> Self {
        Self::from_uri(format!("local://{}", Uuid::new_v4()))
    }

    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(LocalRefInner {
                uri: uri.into(),
                release: None,
            }),
        }
    }

    /// A reference whose `release` hook runs when it is no longer used.
    pub fn with_release<F>(uri: impl Into<String>, release: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(LocalRefInner {
                uri: uri.into(),
                release: Some(Box::new(release)),
            }),
        }
    }

    pub fn uri(&self) -> &str {
        &self.inner.uri
    }
}

impl PartialEq for LocalRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.uri == other.inner.uri
    }
}

impl fmt::Debug for LocalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalRef").field(&self.inner.uri).finish()
    }
}

/// Reference usable to render an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayRef {
    /// Not uploaded yet.
    Local(LocalRef),
    /// Remote identifier returned by the upload service.
    Persisted(String),
}

impl DisplayRef {
    pub fn as_str(&self) -> &str {
        match self {
            DisplayRef::Local(local) => local.uri(),
            DisplayRef::Persisted(id) => id,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, DisplayRef::Persisted(_))
    }
}

/// Upload lifecycle of an entry.
///
/// A pending entry owns its file and local reference; an uploaded entry
/// owns only the remote identifier. There is no state with both.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Pending { file: FileHandle, local: LocalRef },
    Uploaded { remote_id: String },
}

// =============================================================================
// Image Entry
// =============================================================================

/// One image of the ordered collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    key: EntryKey,
    /// Original file name.
    pub name: String,
    upload: UploadState,
    /// User annotation, absent by default.
    pub meta: Option<ImageMeta>,
    /// Visual summary computed at insertion.
    pub summary: VisualSummary,
}

impl ImageEntry {
    /// A freshly dropped image that still has to be uploaded.
    pub fn pending(file: FileHandle, local: LocalRef, summary: VisualSummary) -> Self {
        Self {
            key: EntryKey::new(),
            name: file.name().to_string(),
            upload: UploadState::Pending { file, local },
            meta: None,
            summary,
        }
    }

    /// An image that already lives on the upload service.
    pub fn persisted(
        name: impl Into<String>,
        remote_id: impl Into<String>,
        summary: VisualSummary,
    ) -> Self {
        Self {
            key: EntryKey::new(),
            name: name.into(),
            upload: UploadState::Uploaded {
                remote_id: remote_id.into(),
            },
            meta: None,
            summary,
        }
    }

    pub fn with_meta(mut self, meta: Option<ImageMeta>) -> Self {
        self.meta = meta;
        self
    }

    pub fn key(&self) -> EntryKey {
        self.key
    }

    pub fn upload_state(&self) -> &UploadState {
        &self.upload
    }

    pub fn display_ref(&self) -> DisplayRef {
        match &self.upload {
            UploadState::Pending { local, .. } => DisplayRef::Local(local.clone()),
            UploadState::Uploaded { remote_id } => DisplayRef::Persisted(remote_id.clone()),
        }
    }

    /// The original file, only while the upload is pending.
    pub fn source_handle(&self) -> Option<&FileHandle> {
        match &self.upload {
            UploadState::Pending { file, .. } => Some(file),
            UploadState::Uploaded { .. } => None,
        }
    }

    pub fn remote_id(&self) -> Option<&str> {
        match &self.upload {
            UploadState::Pending { .. } => None,
            UploadState::Uploaded { remote_id } => Some(remote_id),
        }
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(self.upload, UploadState::Uploaded { .. })
    }

    pub fn has_meta(&self) -> bool {
        self.meta.is_some()
    }

    /// Equality of everything but the local key.
    pub fn same_content(&self, other: &ImageEntry) -> bool {
        self.name == other.name
            && self.upload == other.upload
            && self.meta == other.meta
            && self.summary == other.summary
    }

    pub(crate) fn adopt_key(&mut self, key: EntryKey) {
        self.key = key;
    }

    /// Switch to the uploaded state, dropping the file and local reference.
    pub(crate) fn mark_uploaded(&mut self, remote_id: String) {
        self.upload = UploadState::Uploaded { remote_id };
    }

    /// Serialisable view, available once uploaded.
    pub fn to_persisted(&self) -> Option<PersistedImage> {
        let id = self.remote_id()?.to_string();
        Some(PersistedImage {
            id,
            name: self.name.clone(),
            hash: self.summary.hash.clone(),
            width: self.summary.width,
            height: self.summary.height,
            thumbnail: self.summary.thumbnail.clone(),
            meta: self.meta.clone(),
        })
    }
}

/// An uploaded image as submitted with a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedImage {
    pub id: String,
    pub name: String,
    pub hash: String,
    pub width: u32,
    pub height: u32,
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub meta: Option<ImageMeta>,
}

impl From<PersistedImage> for ImageEntry {
    fn from(image: PersistedImage) -> Self {
        let summary = VisualSummary {
            hash: image.hash,
            width: image.width,
            height: image.height,
            thumbnail: image.thumbnail,
        };
        ImageEntry::persisted(image.name, image.id, summary).with_meta(image.meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn summary() -> VisualSummary {
        VisualSummary {
            hash: "L00000fQfQfQfQfQfQfQfQfQfQfQ".into(),
            width: 8,
            height: 6,
            thumbnail: String::new(),
        }
    }

    #[test]
    fn test_pending_entry_has_source_and_local_ref() {
        let file = FileHandle::new("cat.png", vec![1u8, 2, 3]);
        let entry = ImageEntry::pending(file.clone(), LocalRef::detached(), summary());

        assert_eq!(entry.source_handle(), Some(&file));
        assert!(matches!(entry.display_ref(), DisplayRef::Local(_)));
        assert!(entry.to_persisted().is_none());
        assert_eq!(entry.name, "cat.png");
    }

    #[test]
    fn test_mark_uploaded_clears_source() {
        let file = FileHandle::new("cat.png", vec![1u8]);
        let mut entry = ImageEntry::pending(file, LocalRef::detached(), summary());
        let key = entry.key();

        entry.mark_uploaded("img_123".into());

        assert_eq!(entry.key(), key);
        assert!(entry.source_handle().is_none());
        assert_eq!(entry.display_ref(), DisplayRef::Persisted("img_123".into()));
        assert_eq!(entry.to_persisted().unwrap().id, "img_123");
    }

    #[test]
    fn test_local_ref_released_once_after_last_clone() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let local = LocalRef::with_release("blob:1", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let copy = local.clone();

        drop(local);
        assert_eq!(released.load(Ordering::SeqCst), 0);
        drop(copy);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_file_handle_equality_is_by_id() {
        let a = FileHandle::new("same.png", vec![0u8]);
        let b = FileHandle::new("same.png", vec![0u8]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_same_content_ignores_key() {
        let saved = PersistedImage {
            id: "abc".into(),
            name: "dog.jpg".into(),
            hash: "L00000fQfQfQfQfQfQfQfQfQfQfQ".into(),
            width: 8,
            height: 6,
            thumbnail: String::new(),
            meta: None,
        };
        let a = ImageEntry::from(saved.clone());
        let b = ImageEntry::from(saved);

        assert_ne!(a.key(), b.key());
        assert!(a.same_content(&b));
        assert!(!a.same_content(&b.clone().with_meta(Some(ImageMeta::default()))));
    }

    #[test]
    fn test_persisted_image_roundtrip_into_entry() {
        let json = r#"{
            "id": "abc",
            "name": "dog.jpg",
            "hash": "LKO2?U%2Tw=w]~RBVZRi};RPxuwH",
            "width": 640,
            "height": 480,
            "thumbnail": "data:image/png;base64,AAAA",
            "meta": { "prompt": "a dog" }
        }"#;
        let image: PersistedImage = serde_json::from_str(json).unwrap();
        let entry = ImageEntry::from(image);

        assert_eq!(entry.remote_id(), Some("abc"));
        assert_eq!(entry.summary.width, 640);
        assert_eq!(entry.meta.as_ref().and_then(|m| m.prompt.as_deref()), Some("a dog"));
    }
}

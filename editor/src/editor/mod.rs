//! Editor session: the collection wired to its asynchronous collaborators.
//!
//! ```text
//!  insert(files) ─▶ summarize ─▶ append ─▶ spawn upload task ─┐
//!                                                             │ UploadEvent
//!  apply / next_event / settle ◀── mpsc channel ◀─────────────┘
//! ```
//!
//! Upload tasks never touch the collection. They send events that the
//! owner applies on its single mutation path, in arrival order, keyed by
//! file id. Must be used from within a tokio runtime.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::collection::ImageCollection;
use crate::config::EditorConfig;
use crate::drag::{DragController, Point, Rect};
use crate::error::EditorResult;
use crate::meta::ImageMeta;
use crate::models::{EntryKey, FileHandle, ImageEntry, LocalRef, PersistedImage};
use crate::progress::{EntryProgress, ProgressTable, UploadStatus};
use crate::summary::Summarizer;
use crate::upload::{ProgressReporter, UploadEvent, Uploader};

/// A file handed to the editor by a drop or a file picker.
#[derive(Debug, Clone)]
pub struct DroppedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Image collection editor with background uploads.
pub struct ImageUploadEditor {
    collection: ImageCollection,
    progress: ProgressTable,
    drag: DragController,
    summarizer: Summarizer,
    uploader: Arc<dyn Uploader>,
    events_tx: mpsc::UnboundedSender<UploadEvent>,
    events_rx: mpsc::UnboundedReceiver<UploadEvent>,
}

impl ImageUploadEditor {
    pub fn new(config: &EditorConfig, uploader: Arc<dyn Uploader>) -> EditorResult<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            collection: ImageCollection::new(config.max_images, config.primary_image),
            progress: ProgressTable::new(),
            drag: DragController::new(),
            summarizer: Summarizer::from_config(config)?,
            uploader,
            events_tx,
            events_rx,
        })
    }

    /// Start from an existing list (e.g. a post's saved images).
    pub fn with_value(mut self, value: Vec<ImageEntry>) -> Self {
        self.collection = ImageCollection::with_entries(
            self.collection.max(),
            self.collection.is_primary_mode(),
            value,
        );
        self
    }

    /// Register the change callback.
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&[ImageEntry]) + 'static,
    {
        self.collection.on_change(listener);
    }

    pub fn collection(&self) -> &ImageCollection {
        &self.collection
    }

    pub fn entries(&self) -> &[ImageEntry] {
        self.collection.entries()
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn progress_of(&self, key: EntryKey) -> Option<EntryProgress> {
        self.collection.get(key).map(|e| self.progress.status_of(e))
    }

    /// Uploads still running.
    pub fn in_flight(&self) -> usize {
        self.progress.in_flight()
    }

    /// Entries whose last upload attempt failed.
    pub fn failed(&self) -> Vec<(EntryKey, String)> {
        self.collection
            .entries()
            .iter()
            .filter_map(|e| match self.progress.status_of(e) {
                EntryProgress::Failed(reason) => Some((e.key(), reason)),
                _ => None,
            })
            .collect()
    }

    /// Uploaded entries in list order.
    pub fn persisted(&self) -> Vec<PersistedImage> {
        self.collection
            .entries()
            .iter()
            .filter_map(ImageEntry::to_persisted)
            .collect()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add dropped files and start their uploads.
    ///
    /// Files beyond the free slots are ignored; files that cannot be
    /// decoded are skipped. Summaries are computed before anything is
    /// appended.
    pub fn insert(&mut self, files: Vec<DroppedFile>) -> Vec<EntryKey> {
        let slots = self.collection.available_slots();
        let mut prepared = Vec::new();
        let mut ignored = 0;

        for file in files {
            if prepared.len() == slots {
                ignored += 1;
                continue;
            }
            match self.summarizer.summarize(&file.bytes) {
                Ok(summary) => {
                    let handle = FileHandle::new(file.name, file.bytes);
                    prepared.push(ImageEntry::pending(handle, LocalRef::detached(), summary));
                }
                Err(e) => log::warn!("Skipping {}: {}", file.name, e),
            }
        }
        if ignored > 0 {
            log::info!("Ignoring {} file(s) beyond the limit of {}", ignored, self.collection.max());
        }

        let uploads: Vec<FileHandle> = prepared
            .iter()
            .filter_map(|e| e.source_handle().cloned())
            .collect();
        let keys = self.collection.append(prepared);
        for file in uploads {
            self.spawn_upload(file);
        }
        keys
    }

    pub fn reorder(&mut self, source: EntryKey, target: EntryKey) -> bool {
        self.collection.reorder(source, target)
    }

    pub fn edit(&mut self, key: EntryKey, meta: Option<ImageMeta>) -> bool {
        self.collection.edit(key, meta)
    }

    /// Remove an entry. A running upload is not cancelled; its result is
    /// simply discarded.
    pub fn remove(&mut self, key: EntryKey) -> Option<ImageEntry> {
        let removed = self.collection.remove(key)?;
        if let Some(file) = removed.source_handle() {
            self.progress.finish(file.id());
        }
        Some(removed)
    }

    pub fn reconcile(&mut self, external: Vec<ImageEntry>) -> bool {
        self.collection.reconcile(external)
    }

    /// Retry the upload of a pending entry whose last attempt failed.
    pub fn retry_upload(&mut self, key: EntryKey) -> bool {
        let Some(file) = self
            .collection
            .get(key)
            .and_then(|e| e.source_handle())
            .cloned()
        else {
            return false;
        };
        if !matches!(self.progress.get(file.id()), Some(UploadStatus::Failed(_))) {
            return false;
        }

        log::info!("Retrying upload of {}", file.name());
        self.spawn_upload(file);
        true
    }

    /// Retry every failed upload. Returns how many were restarted.
    pub fn retry_failed(&mut self) -> usize {
        let keys: Vec<EntryKey> = self.failed().into_iter().map(|(key, _)| key).collect();
        keys.into_iter().filter(|key| self.retry_upload(*key)).count()
    }

    // =========================================================================
    // Drag & drop
    // =========================================================================

    pub fn drag_start(&mut self, key: EntryKey) -> bool {
        self.collection.get(key).is_some() && self.drag.start(key)
    }

    pub fn drag_pointer_down(&mut self, key: EntryKey, point: Point, rect: Rect) -> bool {
        self.collection.get(key).is_some() && self.drag.pointer_down(key, point, rect)
    }

    pub fn drag_move(&mut self, point: Point, droppables: &[(EntryKey, Rect)]) -> Option<EntryKey> {
        self.drag.pointer_move(point, droppables)
    }

    pub fn drag_over(&mut self, key: Option<EntryKey>) {
        self.drag.set_over(key);
    }

    pub fn drag_end(&mut self) -> Option<(EntryKey, EntryKey)> {
        self.drag.end(&mut self.collection)
    }

    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    // =========================================================================
    // Upload events
    // =========================================================================

    fn spawn_upload(&mut self, file: FileHandle) {
        self.progress.start(file.id());

        let uploader = Arc::clone(&self.uploader);
        let events = self.events_tx.clone();
        let progress_events = self.events_tx.clone();
        let reporter = ProgressReporter::new(file.id(), move |event| {
            let _ = progress_events.send(event);
        });

        tokio::spawn(async move {
            let file_id = file.id();
            let event = match uploader.upload(file, reporter).await {
                Ok(remote_id) => UploadEvent::Completed {
                    file: file_id,
                    remote_id,
                },
                Err(error) => UploadEvent::Failed {
                    file: file_id,
                    error,
                },
            };
            let _ = events.send(event);
        });
    }

    /// Apply one upload event. Returns whether the list changed.
    pub fn apply(&mut self, event: UploadEvent) -> bool {
        match event {
            UploadEvent::Progress { file, percent } => {
                if self.collection.find_by_file(file).is_some() {
                    self.progress.update(file, percent);
                }
                false
            }
            UploadEvent::Completed { file, remote_id } => {
                self.progress.finish(file);
                self.collection.complete_upload(file, remote_id).is_some()
            }
            UploadEvent::Failed { file, error } => {
                if self.collection.find_by_file(file).is_some() {
                    log::warn!("Upload failed: {}", error);
                    self.progress.fail(file, error.to_string());
                } else {
                    self.progress.finish(file);
                }
                false
            }
        }
    }

    /// Wait for the next upload event and apply it.
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        let event = self.events_rx.recv().await?;
        self.apply(event.clone());
        Some(event)
    }

    /// Apply every event already queued. Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Apply events until no upload is in flight.
    pub async fn settle(&mut self) {
        while self.progress.in_flight() > 0 {
            match self.events_rx.recv().await {
                Some(event) => {
                    self.apply(event);
                }
                None => break,
            }
        }
        self.drain();
    }
}

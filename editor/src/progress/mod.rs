//! Upload progress side table.
//!
//! Progress is tracked per [`FileId`], separately from the collection.
//! An entry's progress is looked up through its current file handle;
//! entries without one are uploaded and count as complete.

use std::collections::HashMap;

use crate::models::{FileId, ImageEntry};

/// Recorded state of an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    /// Percentage sent so far (0-100).
    InFlight(u8),
    /// Last attempt failed.
    Failed(String),
}

/// Progress of an entry as shown in the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryProgress {
    Complete,
    Pending(u8),
    Failed(String),
}

impl EntryProgress {
    pub fn percent(&self) -> u8 {
        match self {
            EntryProgress::Complete => 100,
            EntryProgress::Pending(p) => *p,
            EntryProgress::Failed(_) => 0,
        }
    }

    /// Whether a progress ring should be drawn.
    pub fn shows_indicator(&self) -> bool {
        matches!(self, EntryProgress::Pending(p) if *p < 100)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, EntryProgress::Failed(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTable {
    uploads: HashMap<FileId, UploadStatus>,
}

impl ProgressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `file` as started (0%).
    pub fn start(&mut self, file: FileId) {
        self.uploads.insert(file, UploadStatus::InFlight(0));
    }

    /// Record progress, clamped to 100. Failed uploads stay failed.
    pub fn update(&mut self, file: FileId, percent: u8) {
        let percent = percent.min(100);
        match self.uploads.get_mut(&file) {
            Some(UploadStatus::InFlight(current)) => *current = percent,
            Some(UploadStatus::Failed(_)) => {}
            None => {
                self.uploads.insert(file, UploadStatus::InFlight(percent));
            }
        }
    }

    pub fn fail(&mut self, file: FileId, reason: impl Into<String>) {
        self.uploads.insert(file, UploadStatus::Failed(reason.into()));
    }

    /// Forget `file` (upload finished or entry removed).
    pub fn finish(&mut self, file: FileId) -> Option<UploadStatus> {
        self.uploads.remove(&file)
    }

    pub fn get(&self, file: FileId) -> Option<&UploadStatus> {
        self.uploads.get(&file)
    }

    pub fn in_flight(&self) -> usize {
        self.uploads
            .values()
            .filter(|s| matches!(s, UploadStatus::InFlight(_)))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (FileId, &str)> {
        self.uploads.iter().filter_map(|(id, status)| match status {
            UploadStatus::Failed(reason) => Some((*id, reason.as_str())),
            UploadStatus::InFlight(_) => None,
        })
    }

    /// Progress of `entry`, joined through its current file handle.
    pub fn status_of(&self, entry: &ImageEntry) -> EntryProgress {
        let Some(file) = entry.source_handle() else {
            return EntryProgress::Complete;
        };
        match self.uploads.get(&file.id()) {
            Some(UploadStatus::InFlight(p)) => EntryProgress::Pending(*p),
            Some(UploadStatus::Failed(reason)) => EntryProgress::Failed(reason.clone()),
            None => EntryProgress::Pending(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::tests::summary;
    use crate::models::{FileHandle, LocalRef};

    fn pending_entry() -> ImageEntry {
        ImageEntry::pending(FileHandle::new("a.png", vec![0u8]), LocalRef::detached(), summary())
    }

    #[test]
    fn test_lookup_by_current_handle() {
        let entry = pending_entry();
        let file = entry.source_handle().unwrap().id();
        let mut table = ProgressTable::new();

        assert_eq!(table.status_of(&entry), EntryProgress::Pending(0));
        table.start(file);
        table.update(file, 42);
        assert_eq!(table.status_of(&entry), EntryProgress::Pending(42));
        assert!(table.status_of(&entry).shows_indicator());

        table.update(file, 250);
        assert_eq!(table.status_of(&entry), EntryProgress::Pending(100));
        assert!(!table.status_of(&entry).shows_indicator());
    }

    #[test]
    fn test_uploaded_entry_is_complete_without_indicator() {
        let entry = ImageEntry::persisted("done.png", "remote", summary());
        let table = ProgressTable::new();

        let progress = table.status_of(&entry);
        assert_eq!(progress, EntryProgress::Complete);
        assert_eq!(progress.percent(), 100);
        assert!(!progress.shows_indicator());
    }

    #[test]
    fn test_failure_is_sticky_until_restarted() {
        let entry = pending_entry();
        let file = entry.source_handle().unwrap().id();
        let mut table = ProgressTable::new();

        table.start(file);
        table.fail(file, "503");
        table.update(file, 80);
        assert!(table.status_of(&entry).is_failed());
        assert_eq!(table.failed().count(), 1);
        assert_eq!(table.in_flight(), 0);

        table.start(file);
        assert_eq!(table.status_of(&entry), EntryProgress::Pending(0));
        assert_eq!(table.in_flight(), 1);
    }
}

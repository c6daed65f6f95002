//! Ordered image collection.
//!
//! Holds the entries in presentation order and applies every mutation
//! synchronously. All lookups go through [`EntryKey`] or [`FileId`],
//! never through a stored index, so an upload that completes after a
//! reorder still lands on the right entry.
//!
//! Every mutation that changes the visible list notifies the change
//! listener once with the new ordered list.

use std::fmt;

use crate::meta::ImageMeta;
use crate::models::{EntryKey, FileId, ImageEntry};

type ChangeListener = Box<dyn FnMut(&[ImageEntry])>;

/// The editable, ordered list of images.
pub struct ImageCollection {
    entries: Vec<ImageEntry>,
    max: usize,
    primary_mode: bool,
    listener: Option<ChangeListener>,
}

impl ImageCollection {
    /// An empty collection holding at most `max` entries.
    pub fn new(max: usize, primary_mode: bool) -> Self {
        Self {
            entries: Vec::new(),
            max,
            primary_mode,
            listener: None,
        }
    }

    /// Start from an externally supplied list (truncated to `max`).
    pub fn with_entries(max: usize, primary_mode: bool, mut entries: Vec<ImageEntry>) -> Self {
        entries.truncate(max);
        Self {
            entries,
            max,
            primary_mode,
            listener: None,
        }
    }

    /// Register the change listener, replacing any previous one.
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&[ImageEntry]) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.entries);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn available_slots(&self) -> usize {
        self.max.saturating_sub(self.entries.len())
    }

    pub fn is_primary_mode(&self) -> bool {
        self.primary_mode
    }

    pub fn keys(&self) -> Vec<EntryKey> {
        self.entries.iter().map(ImageEntry::key).collect()
    }

    pub fn position(&self, key: EntryKey) -> Option<usize> {
        self.entries.iter().position(|e| e.key() == key)
    }

    pub fn get(&self, key: EntryKey) -> Option<&ImageEntry> {
        self.entries.iter().find(|e| e.key() == key)
    }

    /// Entry still waiting for the upload of `file`.
    pub fn find_by_file(&self, file: FileId) -> Option<&ImageEntry> {
        self.entries
            .iter()
            .find(|e| e.source_handle().map(|h| h.id()) == Some(file))
    }

    /// The featured entry, in primary mode only.
    pub fn primary(&self) -> Option<&ImageEntry> {
        if self.primary_mode {
            self.entries.first()
        } else {
            None
        }
    }

    pub fn is_primary(&self, key: EntryKey) -> bool {
        self.primary().map(|e| e.key() == key).unwrap_or(false)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Append prepared entries in order, ignoring those beyond the limit.
    ///
    /// Returns the keys of the accepted entries.
    pub fn append(&mut self, entries: Vec<ImageEntry>) -> Vec<EntryKey> {
        let slots = self.available_slots();
        let offered = entries.len();
        let accepted: Vec<ImageEntry> = entries.into_iter().take(slots).collect();

        if offered > accepted.len() {
            log::info!(
                "Ignoring {} image(s) beyond the limit of {}",
                offered - accepted.len(),
                self.max
            );
        }
        if accepted.is_empty() {
            return Vec::new();
        }

        let keys = accepted.iter().map(ImageEntry::key).collect();
        self.entries.extend(accepted);
        self.notify();
        keys
    }

    /// Move `source` to the current index of `target`.
    ///
    /// No-op when both keys are equal or one of them is unknown.
    pub fn reorder(&mut self, source: EntryKey, target: EntryKey) -> bool {
        if source == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(source), self.position(target)) else {
            return false;
        };

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        log::debug!("Moved entry {} from {} to {}", source, from, to);
        self.notify();
        true
    }

    /// Replace the metadata of `key`. `None` clears it.
    pub fn edit(&mut self, key: EntryKey, meta: Option<ImageMeta>) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.key() == key) else {
            return false;
        };
        entry.meta = meta;
        self.notify();
        true
    }

    /// Remove `key`, keeping the order of the others.
    pub fn remove(&mut self, key: EntryKey) -> Option<ImageEntry> {
        let index = self.position(key)?;
        let removed = self.entries.remove(index);
        self.notify();
        Some(removed)
    }

    /// Replace the whole list when `external` differs from the current one.
    ///
    /// Entries are compared by content, so a list rebuilt from the same
    /// persisted images is not a change. Incoming entries that match a
    /// current one take over its key.
    pub fn reconcile(&mut self, mut external: Vec<ImageEntry>) -> bool {
        let unchanged = external.len() == self.entries.len()
            && external.iter().zip(&self.entries).all(|(a, b)| a.same_content(b));
        if unchanged {
            return false;
        }
        if external.len() > self.max {
            log::warn!(
                "External list has {} images, keeping the first {}",
                external.len(),
                self.max
            );
            external.truncate(self.max);
        }

        let mut taken = vec![false; self.entries.len()];
        for incoming in external.iter_mut() {
            let matched = self
                .entries
                .iter()
                .enumerate()
                .find(|(i, current)| !taken[*i] && current.same_content(&*incoming));
            if let Some((i, current)) = matched {
                taken[i] = true;
                incoming.adopt_key(current.key());
            }
        }

        self.entries = external;
        self.notify();
        true
    }

    /// Switch the entry waiting on `file` to its persisted reference.
    ///
    /// The entry's local reference and file handle are dropped here.
    /// Returns `None` when no entry waits on `file` anymore (for example
    /// because it was removed while uploading).
    pub fn complete_upload(&mut self, file: FileId, remote_id: impl Into<String>) -> Option<EntryKey> {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.source_handle().map(|h| h.id()) == Some(file))
        else {
            log::debug!("Upload of {} completed for an entry no longer in the list", file);
            return None;
        };

        entry.mark_uploaded(remote_id.into());
        let key = entry.key();
        self.notify();
        Some(key)
    }
}

impl fmt::Debug for ImageCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCollection")
            .field("entries", &self.entries)
            .field("max", &self.max)
            .field("primary_mode", &self.primary_mode)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{FileHandle, LocalRef, PersistedImage};
    use crate::summary::VisualSummary;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub(crate) fn summary() -> VisualSummary {
        VisualSummary {
            hash: "L00000fQfQfQfQfQfQfQfQfQfQfQ".into(),
            width: 4,
            height: 4,
            thumbnail: String::new(),
        }
    }

    fn pending(name: &str) -> ImageEntry {
        ImageEntry::pending(FileHandle::new(name, vec![0u8]), LocalRef::detached(), summary())
    }

    /// Collection with entries `names`, plus a log of every notified list.
    fn collection_with(
        max: usize,
        names: &[&str],
    ) -> (ImageCollection, Vec<EntryKey>, Rc<RefCell<Vec<Vec<EntryKey>>>>) {
        let mut collection = ImageCollection::new(max, false);
        let keys = collection.append(names.iter().map(|n| pending(n)).collect());

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        collection.on_change(move |entries| {
            sink.borrow_mut().push(entries.iter().map(ImageEntry::key).collect());
        });
        (collection, keys, log)
    }

    fn names(collection: &ImageCollection) -> Vec<String> {
        collection.entries().iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_append_preserves_input_order_at_tail() {
        let (mut collection, _, log) = collection_with(10, &["a", "b"]);
        let added = collection.append(vec![pending("c"), pending("d"), pending("e")]);

        assert_eq!(added.len(), 3);
        assert_eq!(names(&collection), ["a", "b", "c", "d", "e"]);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_append_truncates_beyond_max() {
        let (mut collection, _, _) = collection_with(4, &["a", "b", "c"]);
        let added = collection.append(vec![pending("d"), pending("e"), pending("f")]);

        assert_eq!(added.len(), 1);
        assert_eq!(collection.len(), 4);
        assert_eq!(names(&collection), ["a", "b", "c", "d"]);

        let none = collection.append(vec![pending("g")]);
        assert!(none.is_empty());
        assert_eq!(collection.len(), 4);
    }

    #[test]
    fn test_full_collection_append_does_not_notify() {
        let (mut collection, _, log) = collection_with(1, &["a"]);
        collection.append(vec![pending("b")]);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_example_scenario() {
        let (mut collection, keys, log) = collection_with(10, &["A", "B", "C"]);
        let (a, b, c) = (keys[0], keys[1], keys[2]);

        assert!(collection.reorder(a, c));
        assert_eq!(names(&collection), ["B", "C", "A"]);

        let meta = ImageMeta {
            prompt: Some("x".into()),
            ..ImageMeta::default()
        };
        assert!(collection.edit(c, Some(meta.clone())));
        assert_eq!(names(&collection), ["B", "C", "A"]);
        assert_eq!(collection.get(c).unwrap().meta, Some(meta));

        assert!(collection.remove(b).is_some());
        assert_eq!(names(&collection), ["C", "A"]);
        assert_eq!(collection.keys(), vec![c, a]);

        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_move_and_move_back() {
        let (mut collection, keys, _) = collection_with(10, &["A", "B", "C"]);
        let (a, b) = (keys[0], keys[1]);

        collection.reorder(a, keys[2]);
        assert_eq!(names(&collection), ["B", "C", "A"]);

        // A is now last; moving it onto B's slot restores the original order
        collection.reorder(a, b);
        assert_eq!(names(&collection), ["A", "B", "C"]);
    }

    #[test]
    fn test_reorder_noops() {
        let (mut collection, keys, log) = collection_with(10, &["A", "B"]);

        assert!(!collection.reorder(keys[0], keys[0]));
        assert!(!collection.reorder(keys[0], EntryKey::new()));
        assert!(!collection.reorder(EntryKey::new(), keys[1]));
        assert_eq!(names(&collection), ["A", "B"]);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_keys_stable_across_edits_and_reorders() {
        let (mut collection, keys, _) = collection_with(10, &["A", "B", "C"]);
        collection.reorder(keys[2], keys[0]);
        collection.edit(keys[1], None);

        let mut after = collection.keys();
        after.sort_by_key(|k| k.to_string());
        let mut before = keys.clone();
        before.sort_by_key(|k| k.to_string());
        assert_eq!(after, before);
    }

    #[test]
    fn test_edit_and_remove_unknown_key() {
        let (mut collection, _, log) = collection_with(10, &["A"]);
        assert!(!collection.edit(EntryKey::new(), None));
        assert!(collection.remove(EntryKey::new()).is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_reconcile_equal_list_is_noop() {
        let (mut collection, _, log) = collection_with(10, &["A", "B"]);
        let same = collection.entries().to_vec();

        assert!(!collection.reconcile(same));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_reconcile_different_list_replaces_once() {
        let (mut collection, _, log) = collection_with(10, &["A", "B"]);
        let external = vec![
            ImageEntry::persisted("X", "id-x", summary()),
            ImageEntry::persisted("Y", "id-y", summary()),
        ];
        let expected: Vec<EntryKey> = external.iter().map(ImageEntry::key).collect();

        assert!(collection.reconcile(external));
        assert_eq!(names(&collection), ["X", "Y"]);
        assert_eq!(*log.borrow(), vec![expected]);
    }

    fn saved_images() -> Vec<PersistedImage> {
        ["a", "b"]
            .iter()
            .map(|id| PersistedImage {
                id: format!("id-{}", id),
                name: format!("{}.png", id),
                hash: summary().hash,
                width: 8,
                height: 6,
                thumbnail: String::new(),
                meta: None,
            })
            .collect()
    }

    #[test]
    fn test_reconcile_same_saved_list_is_noop() {
        let saved = saved_images();
        let mut collection =
            ImageCollection::with_entries(10, false, saved.iter().cloned().map(ImageEntry::from).collect());
        let keys = collection.keys();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        collection.on_change(move |_| *counter.borrow_mut() += 1);

        assert!(!collection.reconcile(saved.iter().cloned().map(ImageEntry::from).collect()));
        assert!(!collection.reconcile(saved.into_iter().map(ImageEntry::from).collect()));
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(collection.keys(), keys);
    }

    #[test]
    fn test_reconcile_keeps_keys_of_matching_entries() {
        let saved = saved_images();
        let mut collection =
            ImageCollection::with_entries(10, false, saved.iter().cloned().map(ImageEntry::from).collect());
        let keys = collection.keys();

        let mut reordered: Vec<ImageEntry> = saved.into_iter().rev().map(ImageEntry::from).collect();
        reordered.push(ImageEntry::persisted("c.png", "id-c", summary()));
        let added = reordered[2].key();

        assert!(collection.reconcile(reordered));
        assert_eq!(collection.keys(), vec![keys[1], keys[0], added]);
    }

    #[test]
    fn test_seeded_collection_ignores_its_initial_value() {
        let initial: Vec<ImageEntry> = saved_images().into_iter().map(ImageEntry::from).collect();
        let mut collection = ImageCollection::with_entries(10, true, initial.clone());
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        collection.on_change(move |_| *counter.borrow_mut() += 1);

        assert!(!collection.reconcile(initial));
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_reconcile_truncates_to_max() {
        let (mut collection, _, _) = collection_with(2, &[]);
        let external = (0..4)
            .map(|i| ImageEntry::persisted(format!("{}", i), format!("id-{}", i), summary()))
            .collect();
        collection.reconcile(external);
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_complete_upload_after_reorder_targets_right_entry() {
        let mut collection = ImageCollection::new(10, false);
        let first = pending("first");
        let second = pending("second");
        let second_file = second.source_handle().unwrap().id();
        let keys = collection.append(vec![first, second]);

        collection.reorder(keys[1], keys[0]);
        let done = collection.complete_upload(second_file, "remote-2");

        assert_eq!(done, Some(keys[1]));
        let entry = collection.get(keys[1]).unwrap();
        assert_eq!(entry.remote_id(), Some("remote-2"));
        assert!(entry.source_handle().is_none());
        assert!(!collection.get(keys[0]).unwrap().is_uploaded());
    }

    #[test]
    fn test_completion_after_removal_is_noop() {
        let (mut collection, keys, log) = collection_with(10, &["A", "B"]);
        let file = collection.get(keys[0]).unwrap().source_handle().unwrap().id();

        collection.remove(keys[0]);
        assert_eq!(collection.complete_upload(file, "late"), None);
        assert_eq!(names(&collection), ["B"]);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_completion_releases_local_reference() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let local = LocalRef::with_release("blob:test", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let file = FileHandle::new("a.png", vec![1u8]);
        let file_id = file.id();

        let mut collection = ImageCollection::new(10, false);
        collection.append(vec![ImageEntry::pending(file, local, summary())]);
        assert_eq!(released.load(Ordering::SeqCst), 0);

        collection.complete_upload(file_id, "remote");
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropping_collection_releases_local_references() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut collection = ImageCollection::new(10, false);
        for i in 0..3 {
            let counter = Arc::clone(&released);
            let local = LocalRef::with_release(format!("blob:{}", i), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            collection.append(vec![ImageEntry::pending(
                FileHandle::new("x.png", vec![0u8]),
                local,
                summary(),
            )]);
        }

        drop(collection);
        assert_eq!(released.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_primary_entry() {
        let mut collection = ImageCollection::new(10, true);
        let keys = collection.append(vec![pending("A"), pending("B")]);

        assert!(collection.is_primary(keys[0]));
        collection.reorder(keys[1], keys[0]);
        assert!(collection.is_primary(keys[1]));

        let plain = ImageCollection::with_entries(10, false, collection.entries().to_vec());
        assert!(plain.primary().is_none());
    }
}

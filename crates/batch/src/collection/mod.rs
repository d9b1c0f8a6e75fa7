//! The ordered, owning collection of [`MediaRecord`]s for one directory.
//!
//! All operations here are pure in-memory bookkeeping. Indices are positions
//! in the current user-visible ordering; an out-of-range index is an error,
//! never a silent clamp.

mod clipboard;
mod renumber;
mod search;

pub use self::search::{SearchCursor, SearchScope};

use crate::error::{ErrorKind, Result};
use crate::record::{MediaRecord, RecordId};
use crate::watch::FsEvent;
use exn::OptionExt;
use remo_codec::SeparatorSet;
use remo_storage::FileMeta;
use std::collections::HashMap;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Emitted after collection mutations so a frontend can repaint without
/// polling. Dropping the receiver silently disables notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    /// The whole collection was (re)built from a directory scan.
    Loaded,
    /// Record fields or ordering changed in place.
    Changed,
    RecordAdded(RecordId),
    RecordRemoved(RecordId),
    /// The file's bytes changed on disk; any cached decode of it is stale.
    ContentInvalidated(RecordId),
}

/// Per-directory knobs, fixed for the collection's lifetime.
#[derive(Debug, Clone)]
pub struct CollectionOptions {
    /// Which digit run is the counter (1-based). `None` lets the directory
    /// scan vote on it.
    pub counter_position: Option<usize>,
    pub separators: SeparatorSet,
    /// Compare resulting filenames case-insensitively when hunting for
    /// conflicts (the safe default for FAT/NTFS/APFS media volumes).
    pub case_insensitive: bool,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self { counter_position: None, separators: SeparatorSet::default(), case_insensitive: true }
    }
}

impl From<&remo_config::Config> for CollectionOptions {
    fn from(config: &remo_config::Config) -> Self {
        Self {
            counter_position: config.counter_position,
            separators: SeparatorSet::new(config.separators.chars()),
            case_insensitive: config.case_insensitive,
        }
    }
}

/// The in-memory batch: live records in user order, soft-deleted records
/// queued for the next save, and a single-use cut/paste clipboard.
#[derive(Debug)]
pub struct MediaCollection {
    files: Vec<MediaRecord>,
    deleted: Vec<MediaRecord>,
    /// Ids cut out of `files`; consumed by the next [`paste`](Self::paste).
    clipboard: Option<Vec<RecordId>>,
    counter_position: usize,
    separators: SeparatorSet,
    case_insensitive: bool,
    next_id: u64,
    cursor: Option<SearchCursor>,
    events: Option<UnboundedSender<CollectionEvent>>,
}

impl MediaCollection {
    pub(crate) fn empty(counter_position: usize, options: &CollectionOptions) -> Self {
        Self {
            files: Vec::new(),
            deleted: Vec::new(),
            clipboard: None,
            counter_position,
            separators: options.separators.clone(),
            case_insensitive: options.case_insensitive,
            next_id: 0,
            cursor: None,
            events: None,
        }
    }

    /// Wraps `meta` in a fresh record and appends it, preserving scan order.
    pub(crate) fn push_meta(&mut self, meta: &FileMeta) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.files.push(MediaRecord::from_meta(id, meta, self.counter_position, &self.separators));
        id
    }

    /// Starts change notification, replacing any previous subscriber.
    pub fn subscribe(&mut self) -> UnboundedReceiver<CollectionEvent> {
        let (sender, receiver) = unbounded_channel();
        self.events = Some(sender);
        receiver
    }

    pub(crate) fn emit(&self, event: CollectionEvent) {
        if let Some(sender) = &self.events {
            // A dropped receiver just means nobody is listening anymore.
            let _ = sender.send(event);
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn counter_position(&self) -> usize {
        self.counter_position
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn records(&self) -> &[MediaRecord] {
        &self.files
    }

    /// Mutable record access for the rename engine's commit callbacks.
    pub fn records_mut(&mut self) -> &mut [MediaRecord] {
        &mut self.files
    }

    pub fn get(&self, index: usize) -> Result<&MediaRecord> {
        let len = self.files.len();
        self.files.get(index).ok_or_raise(|| ErrorKind::IndexOutOfRange { index, len })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut MediaRecord> {
        let len = self.files.len();
        self.files.get_mut(index).ok_or_raise(|| ErrorKind::IndexOutOfRange { index, len })
    }

    pub fn record_by_id(&self, id: RecordId) -> Option<&MediaRecord> {
        self.files.iter().find(|record| record.id() == id)
    }

    pub fn record_by_id_mut(&mut self, id: RecordId) -> Option<&mut MediaRecord> {
        self.files.iter_mut().find(|record| record.id() == id)
    }

    pub fn index_of(&self, id: RecordId) -> Option<usize> {
        self.files.iter().position(|record| record.id() == id)
    }

    /// Records awaiting physical deletion at the next save.
    pub fn deleted(&self) -> &[MediaRecord] {
        &self.deleted
    }

    /// The rename engine calls this once a deleted record's file has been
    /// moved to the trash; the record is gone for good afterwards.
    pub fn finish_delete(&mut self, id: RecordId) {
        self.deleted.retain(|record| record.id() != id);
    }

    /// Moves the record at `from` so it ends up at position `to`, shifting
    /// everything in between. Ordering is user-significant: renumbering runs
    /// over it.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.files.len();
        if from >= len {
            exn::bail!(ErrorKind::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            exn::bail!(ErrorKind::IndexOutOfRange { index: to, len });
        }
        if from != to {
            let record = self.files.remove(from);
            self.files.insert(to, record);
            self.emit(CollectionEvent::Changed);
        }
        Ok(())
    }

    /// Recomputes `conflicting_name` for every record: a record conflicts
    /// when at least one other record resolves to the same resulting
    /// filename. At most one of them can ever own the physical name.
    pub fn mark_conflicts(&mut self) {
        let mut counts: HashMap<String, u32> = HashMap::with_capacity(self.files.len());
        for record in &self.files {
            *counts.entry(self.fold_name(&record.resulting_filename())).or_default() += 1;
        }
        for record in &mut self.files {
            let folded = if self.case_insensitive {
                record.resulting_filename().to_lowercase()
            } else {
                record.resulting_filename()
            };
            record.set_conflicting(counts.get(&folded).copied().unwrap_or(0) > 1);
        }
        self.emit(CollectionEvent::Changed);
    }

    fn fold_name(&self, name: &str) -> String {
        if self.case_insensitive { name.to_lowercase() } else { name.to_string() }
    }

    /// True while any record (live or deleted) still needs disk work.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.deleted.is_empty() || self.files.iter().any(MediaRecord::has_pending_changes)
    }

    /// Watcher bookkeeping. Only updates in-memory state from the metadata
    /// the event carries; never touches the disk itself.
    pub fn apply_fs_event(&mut self, event: FsEvent) {
        match event {
            FsEvent::Created(meta) => {
                if meta.is_hidden() {
                    return;
                }
                if let Some(existing) = self.files.iter_mut().find(|record| record.path() == meta.path) {
                    // Duplicate create (watcher replay); treat as modify.
                    existing.refresh_meta(&meta);
                    let id = existing.id();
                    self.emit(CollectionEvent::ContentInvalidated(id));
                    return;
                }
                let id = self.push_meta(&meta);
                tracing::debug!(path = %meta.path.display(), %id, "watcher added record");
                self.emit(CollectionEvent::RecordAdded(id));
            }
            FsEvent::Modified(meta) => {
                match self.files.iter_mut().find(|record| record.path() == meta.path) {
                    Some(record) => {
                        record.refresh_meta(&meta);
                        let id = record.id();
                        self.emit(CollectionEvent::ContentInvalidated(id));
                    }
                    // Some platforms drop the create event and only report
                    // the follow-up write.
                    None => self.apply_fs_event(FsEvent::Created(meta)),
                }
            }
            FsEvent::Deleted(path) => {
                match self.files.iter().position(|record| record.path() == path) {
                    Some(index) => {
                        let record = self.files.remove(index);
                        tracing::debug!(path = %path.display(), id = %record.id(), "watcher removed record");
                        self.emit(CollectionEvent::RecordRemoved(record.id()));
                    }
                    None => {
                        // Nothing to remove and no metadata to add from.
                        tracing::debug!(path = %path.display(), "delete event for unknown file ignored");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use time::macros::datetime;

    /// Builds a collection straight from filenames, counter position 1.
    pub(crate) fn collection(names: &[&str]) -> MediaCollection {
        let mut collection = MediaCollection::empty(1, &CollectionOptions::default());
        for (index, name) in names.iter().enumerate() {
            let meta = FileMeta::new(*name, 1000 + index as u64, datetime!(2017-06-01 12:00:00 UTC));
            collection.push_meta(&meta);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::collection;
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_get_out_of_range() {
        let coll = collection(&["a1.jpg"]);
        let err = coll.get(5).unwrap_err();
        assert!(matches!(&*err, ErrorKind::IndexOutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn test_reorder() {
        let mut coll = collection(&["a1.jpg", "b2.jpg", "c3.jpg"]);
        coll.reorder(0, 2).unwrap();
        let names: Vec<_> = coll.records().iter().map(|r| r.file_name().to_string()).collect();
        assert_eq!(names, ["b2.jpg", "c3.jpg", "a1.jpg"]);
        assert!(coll.reorder(0, 3).is_err());
    }

    #[test]
    fn test_mark_conflicts_case_insensitive() {
        let mut coll = collection(&["img1.jpg", "other2.jpg"]);
        coll.get_mut(1).unwrap().set_prefix("IMG");
        coll.get_mut(1).unwrap().set_counter("1");
        coll.mark_conflicts();
        assert!(coll.get(0).unwrap().conflicting_name());
        assert!(coll.get(1).unwrap().conflicting_name());
        // Resolving the clash on one side clears both.
        coll.get_mut(1).unwrap().set_counter("2");
        coll.mark_conflicts();
        assert!(!coll.get(0).unwrap().conflicting_name());
        assert!(!coll.get(1).unwrap().conflicting_name());
    }

    #[test]
    fn test_mark_conflicts_case_sensitive() {
        let options = CollectionOptions { case_insensitive: false, ..CollectionOptions::default() };
        let mut coll = MediaCollection::empty(1, &options);
        for name in ["img1.jpg", "IMG1.jpg"] {
            coll.push_meta(&FileMeta::new(name, 10, datetime!(2017-06-01 12:00:00 UTC)));
        }
        coll.mark_conflicts();
        assert!(!coll.get(0).unwrap().conflicting_name());
        assert!(!coll.get(1).unwrap().conflicting_name());
    }

    #[tokio::test]
    async fn test_watcher_create_modify_delete() {
        let mut coll = collection(&["a1.jpg"]);
        let mut events = coll.subscribe();

        let meta = FileMeta::new("b2.jpg", 20, datetime!(2018-01-01 00:00:00 UTC));
        coll.apply_fs_event(FsEvent::Created(meta.clone()));
        assert_eq!(coll.len(), 2);
        let added = events.recv().await.unwrap();
        assert!(matches!(added, CollectionEvent::RecordAdded(_)));

        let modified = FileMeta::new("b2.jpg", 25, datetime!(2018-01-02 00:00:00 UTC));
        coll.apply_fs_event(FsEvent::Modified(modified));
        assert_eq!(coll.records()[1].size(), 25);
        assert!(matches!(events.recv().await.unwrap(), CollectionEvent::ContentInvalidated(_)));

        coll.apply_fs_event(FsEvent::Deleted("b2.jpg".into()));
        assert_eq!(coll.len(), 1);
        assert!(matches!(events.recv().await.unwrap(), CollectionEvent::RecordRemoved(_)));
    }

    #[test]
    fn test_watcher_modify_unknown_is_create() {
        let mut coll = collection(&[]);
        let meta = FileMeta::new("late1.jpg", 5, datetime!(2018-01-01 00:00:00 UTC));
        coll.apply_fs_event(FsEvent::Modified(meta));
        assert_eq!(coll.len(), 1);
        assert_eq!(coll.records()[0].file_name(), "late1.jpg");
    }

    #[test]
    fn test_watcher_delete_unknown_is_noop() {
        let mut coll = collection(&["a1.jpg"]);
        coll.apply_fs_event(FsEvent::Deleted("phantom.jpg".into()));
        assert_eq!(coll.len(), 1);
    }

    #[test]
    fn test_watcher_ignores_hidden_create() {
        let mut coll = collection(&[]);
        coll.apply_fs_event(FsEvent::Created(FileMeta::new(
            ".DS_Store",
            0,
            datetime!(2018-01-01 00:00:00 UTC),
        )));
        assert!(coll.is_empty());
    }
}

//! Soft deletes, cut/paste, and restore.
//!
//! Deleting never touches the disk: records move to the deleted list and
//! stay there until the next save commits the physical (trash) delete.
//! The clipboard is a single-use snapshot of the most recent cut.

use super::{CollectionEvent, MediaCollection};
use crate::error::{ErrorKind, Result};
use crate::record::RecordId;

impl MediaCollection {
    /// Moves the records at `indices` to the deleted list, keeping their
    /// relative order. With `to_clipboard`, the same records also become the
    /// new clipboard (replacing any previous cut) so they can be pasted
    /// back at another position.
    pub fn delete(&mut self, indices: &[usize], to_clipboard: bool) -> Result<()> {
        let len = self.files.len();
        for &index in indices {
            if index >= len {
                exn::bail!(ErrorKind::IndexOutOfRange { index, len });
            }
        }
        let mut ordered = indices.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut cut = Vec::with_capacity(ordered.len());
        // Remove back to front so earlier indices stay valid.
        for &index in ordered.iter().rev() {
            cut.push(self.files.remove(index));
        }
        cut.reverse();

        if to_clipboard {
            self.clipboard = Some(cut.iter().map(|record| record.id()).collect());
        }
        for record in cut {
            self.emit(CollectionEvent::RecordRemoved(record.id()));
            self.deleted.push(record);
        }
        Ok(())
    }

    /// Restores the current clipboard at `at` and consumes it. Fails when
    /// nothing was cut (or the clipboard was already pasted).
    pub fn paste(&mut self, at: usize) -> Result<()> {
        let Some(ids) = self.clipboard.take() else {
            exn::bail!(ErrorKind::Invalid("nothing on the clipboard".to_string()));
        };
        self.undelete(at, &ids)
    }

    /// Moves `ids` from the deleted list back into the live list, inserted
    /// as a block starting at `at`. The general form of paste, also used by
    /// an explicit restore action without clipboard involvement.
    pub fn undelete(&mut self, at: usize, ids: &[RecordId]) -> Result<()> {
        // Insertion at len() appends.
        let len = self.files.len();
        if at > len {
            exn::bail!(ErrorKind::IndexOutOfRange { index: at, len });
        }
        for id in ids {
            if !self.deleted.iter().any(|record| record.id() == *id) {
                exn::bail!(ErrorKind::Invalid(format!("record {id} is not deleted")));
            }
        }
        for (offset, id) in ids.iter().enumerate() {
            // Presence was checked above; position() cannot miss here.
            if let Some(position) = self.deleted.iter().position(|record| record.id() == *id) {
                let record = self.deleted.remove(position);
                self.files.insert(at + offset, record);
                self.emit(CollectionEvent::RecordAdded(*id));
            }
        }
        Ok(())
    }
}

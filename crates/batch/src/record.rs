//! One wrapped file: structured name fields, dirty flags, error flags.

use crate::kind::MediaKind;
use remo_codec::{NameParts, SeparatorSet, decompose, format_counter};
use remo_storage::FileMeta;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Display/edit format for the modification timestamp column.
const MODIFIED_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Formats a file timestamp the way the date column displays it (UTC).
pub fn format_modified(modified: OffsetDateTime) -> String {
    // The format items are static and complete; formatting can only fail on
    // a year outside ±9999, which no filesystem timestamp reaches.
    modified.to_offset(UtcOffset::UTC).format(MODIFIED_FORMAT).unwrap_or_default()
}

/// Parses an edited date-column string back into a timestamp.
///
/// Returns `None` for text that does not match the display format; the
/// rename engine reports that as a timestamp write error rather than
/// guessing.
pub fn parse_modified(text: &str) -> Option<OffsetDateTime> {
    PrimitiveDateTime::parse(text, MODIFIED_FORMAT).ok().map(PrimitiveDateTime::assume_utc)
}

/// Stable identity of a record, independent of its (mutable) path.
///
/// The content cache keys on this, so a rename never orphans cached content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) u64);

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#{}", self.0)
    }
}

/// A pending lossless rotation, in quarter turns clockwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// One more quarter turn clockwise; four of them cancel out.
    #[must_use]
    pub fn rotate_cw(self) -> Self {
        match self {
            Rotation::None => Rotation::Cw90,
            Rotation::Cw90 => Rotation::Cw180,
            Rotation::Cw180 => Rotation::Cw270,
            Rotation::Cw270 => Rotation::None,
        }
    }

    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }
}

/// The structured, mutable in-memory representation of one file.
///
/// Owned exclusively by one [`MediaCollection`](crate::MediaCollection);
/// every mutation that affects the resulting filename or timestamp raises
/// the matching dirty flag, and the rename engine clears those flags as it
/// commits.
#[derive(Debug, Clone)]
pub struct MediaRecord {
    id: RecordId,
    /// Current on-disk path, relative to the backend root. Changes only
    /// when a rename actually commits.
    path: PathBuf,
    parts: NameParts,
    kind: MediaKind,
    size: u64,
    modified: OffsetDateTime,
    modified_text: String,

    filename_changed: bool,
    timestamp_changed: bool,
    rotation: Rotation,
    flip_horizontal: bool,
    flip_vertical: bool,

    conflicting_name: bool,
    rename_error: bool,
    timestamp_write_error: bool,
    /// The record sits at a unique intermediate name, waiting for the second
    /// rename pass. Displays as a (temporary) rename error.
    intermediate_renamed: bool,
}

impl MediaRecord {
    pub(crate) fn from_meta(
        id: RecordId,
        meta: &FileMeta,
        counter_position: usize,
        separators: &SeparatorSet,
    ) -> Self {
        let parts = decompose(meta.file_name(), counter_position, separators);
        Self {
            id,
            path: meta.path.clone(),
            kind: MediaKind::from_path(&meta.path),
            size: meta.size,
            modified: meta.modified,
            modified_text: format_modified(meta.modified),
            parts,
            filename_changed: false,
            timestamp_changed: false,
            rotation: Rotation::None,
            flip_horizontal: false,
            flip_vertical: false,
            conflicting_name: false,
            rename_error: false,
            timestamp_write_error: false,
            intermediate_renamed: false,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current on-disk filename (final path component).
    pub fn file_name(&self) -> &str {
        self.path.file_name().and_then(|name| name.to_str()).unwrap_or_default()
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn parts(&self) -> &NameParts {
        &self.parts
    }

    pub fn modified(&self) -> OffsetDateTime {
        self.modified
    }

    pub fn modified_text(&self) -> &str {
        &self.modified_text
    }

    /// The filename this record will have after the next save. Recomputed on
    /// demand, never stored.
    pub fn resulting_filename(&self) -> String {
        self.parts.compose()
    }

    // ------ user edits (raise dirty flags) ------

    pub fn set_prefix(&mut self, value: impl Into<String>) {
        self.set_name_field(|parts| &mut parts.prefix, value.into());
    }

    pub fn set_counter(&mut self, value: impl Into<String>) {
        self.set_name_field(|parts| &mut parts.counter, value.into());
    }

    /// Renumbering entry point: formats `value` at `width` into the counter.
    pub fn set_counter_value(&mut self, value: u64, width: usize) {
        self.set_counter(format_counter(value, width));
    }

    pub fn set_separator(&mut self, value: impl Into<String>) {
        self.set_name_field(|parts| &mut parts.separator, value.into());
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.set_name_field(|parts| &mut parts.description, value.into());
    }

    pub fn set_extension(&mut self, value: impl Into<String>) {
        self.set_name_field(|parts| &mut parts.extension, value.into());
    }

    fn set_name_field(&mut self, field: impl FnOnce(&mut NameParts) -> &mut String, value: String) {
        let slot = field(&mut self.parts);
        if *slot != value {
            *slot = value;
            self.refresh_filename_changed();
        }
    }

    /// A name edit is only "changed" while it differs from what is on disk;
    /// editing a field back to its original value clears the flag.
    fn refresh_filename_changed(&mut self) {
        self.filename_changed = self.resulting_filename() != self.file_name();
    }

    pub fn set_modified_text(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.modified_text != value {
            self.modified_text = value;
            self.timestamp_changed = self.modified_text != format_modified(self.modified);
        }
    }

    pub fn rotate_cw(&mut self) {
        self.rotation = self.rotation.rotate_cw();
    }

    pub fn toggle_flip_horizontal(&mut self) {
        self.flip_horizontal = !self.flip_horizontal;
    }

    pub fn toggle_flip_vertical(&mut self) {
        self.flip_vertical = !self.flip_vertical;
    }

    // ------ flags ------

    pub fn filename_changed(&self) -> bool {
        self.filename_changed
    }

    pub fn timestamp_changed(&self) -> bool {
        self.timestamp_changed
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn flip_horizontal(&self) -> bool {
        self.flip_horizontal
    }

    pub fn flip_vertical(&self) -> bool {
        self.flip_vertical
    }

    pub fn has_pending_transform(&self) -> bool {
        self.rotation != Rotation::None || self.flip_horizontal || self.flip_vertical
    }

    pub fn has_pending_changes(&self) -> bool {
        self.filename_changed || self.timestamp_changed || self.has_pending_transform()
    }

    pub fn conflicting_name(&self) -> bool {
        self.conflicting_name
    }

    pub fn rename_error(&self) -> bool {
        self.rename_error
    }

    pub fn timestamp_write_error(&self) -> bool {
        self.timestamp_write_error
    }

    pub fn intermediate_renamed(&self) -> bool {
        self.intermediate_renamed
    }

    /// One character summarizing the record's worst current flag.
    ///
    /// Priority: rename error (a parked intermediate rename counts), then
    /// timestamp write error, then a naming conflict, then "has pending
    /// changes", then clean.
    pub fn status_char(&self) -> char {
        if self.rename_error || self.intermediate_renamed {
            '!'
        } else if self.timestamp_write_error {
            't'
        } else if self.conflicting_name {
            'c'
        } else if self.has_pending_changes() {
            '*'
        } else {
            ' '
        }
    }

    // ------ commit results (the rename engine reports back) ------

    /// A rename reached its final target: the record's identity follows the
    /// file, and the error state from any earlier attempt is cleared.
    pub fn commit_rename(&mut self, new_path: PathBuf) {
        self.path = new_path;
        self.filename_changed = false;
        self.rename_error = false;
        self.intermediate_renamed = false;
    }

    /// Pass 1 parked this record at a unique intermediate name; the final
    /// name is retried in pass 2, so `filename_changed` stays set.
    pub fn park_at_intermediate(&mut self, intermediate_path: PathBuf) {
        self.path = intermediate_path;
        self.intermediate_renamed = true;
    }

    pub fn mark_rename_error(&mut self) {
        self.rename_error = true;
    }

    pub fn commit_timestamp(&mut self, modified: OffsetDateTime) {
        self.modified = modified;
        self.modified_text = format_modified(modified);
        self.timestamp_changed = false;
        self.timestamp_write_error = false;
    }

    pub fn mark_timestamp_error(&mut self) {
        self.timestamp_write_error = true;
    }

    /// The lossless transform collaborator succeeded; user intent is spent.
    pub fn clear_transform(&mut self) {
        self.rotation = Rotation::None;
        self.flip_horizontal = false;
        self.flip_vertical = false;
    }

    pub(crate) fn set_conflicting(&mut self, conflicting: bool) {
        self.conflicting_name = conflicting;
    }

    /// Watcher bookkeeping: the file changed on disk underneath us. Pending
    /// user edits are kept; only the factual metadata is refreshed.
    pub(crate) fn refresh_meta(&mut self, meta: &FileMeta) {
        self.size = meta.size;
        self.modified = meta.modified;
        if !self.timestamp_changed {
            self.modified_text = format_modified(meta.modified);
        }
    }

    // ------ search/replace column access ------

    /// Columns in fixed scan order: prefix, counter, separator, description,
    /// extension, date.
    pub(crate) const COLUMNS: usize = 6;

    pub(crate) fn column(&self, column: usize) -> &str {
        match column {
            0 => &self.parts.prefix,
            1 => &self.parts.counter,
            2 => &self.parts.separator,
            3 => &self.parts.description,
            4 => &self.parts.extension,
            _ => &self.modified_text,
        }
    }

    pub(crate) fn set_column(&mut self, column: usize, value: String) {
        match column {
            0 => self.set_prefix(value),
            1 => self.set_counter(value),
            2 => self.set_separator(value),
            3 => self.set_description(value),
            4 => self.set_extension(value),
            _ => self.set_modified_text(value),
        }
    }
}

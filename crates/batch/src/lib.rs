//! The in-memory virtual rename batch.
//!
//! A directory of media files is loaded once into a [`MediaCollection`] of
//! [`MediaRecord`]s, edited freely in memory (renumbering, search/replace,
//! cut/paste, soft deletes), and only written back to disk when the rename
//! engine commits the batch. Nothing in this crate performs disk I/O after
//! the initial load; mutation here is bookkeeping, always.

pub mod collection;
pub mod error;
mod export;
mod kind;
mod load;
mod record;
mod watch;

pub use crate::collection::{
    CollectionEvent, CollectionOptions, MediaCollection, SearchCursor, SearchScope,
};
pub use crate::kind::MediaKind;
pub use crate::load::load_directory;
pub use crate::record::{MediaRecord, RecordId, Rotation, format_modified, parse_modified};
pub use crate::watch::FsEvent;

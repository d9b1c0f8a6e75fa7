//! The on-disk commit of a rename batch.
//!
//! Consumes a [`MediaCollection`](remo_batch::MediaCollection) whose records
//! carry pending changes and performs the actual file-system work: physical
//! (trash) deletes first, then filename renames in up to two passes to ride
//! out transient name collisions, then timestamp writes, then lossless
//! content transforms.
//!
//! Per-record failures never abort the batch. Every failure is recorded as a
//! flag on the record itself and the engine carries on with the remaining
//! records; the [`SaveSummary`] at the end of the stream reports the
//! aggregate so a caller can point the user at the flagged rows.
//!
//! The primary entry point is [`save`], which streams [`SaveEvent`]s — one
//! per file-system operation — so a frontend can show live progress and
//! cancel between records via the [`CancelFlag`].

pub mod error;
mod save;
mod transform;

pub use self::save::{CancelFlag, RecordOutcome, SaveEvent, SaveOptions, SaveStatus, SaveSummary, save};
pub use self::transform::{LosslessTransform, NoopTransform, TransformHandle};

//! Error types for the in-memory batch.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A batch error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for batch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a batch failure.
///
/// The collection operations are pure in-memory transformations: the only
/// way they fail is a precondition violation, which is reported rather than
/// silently clamped.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An index points outside the current file list.
    #[display("index {index} out of range (collection holds {len} records)")]
    IndexOutOfRange { index: usize, len: usize },
    /// The storage backend failed during the initial directory load.
    Storage,
    /// Writing the CSV export failed.
    #[display("CSV export failed: {_0}")]
    Export(IoError),
    /// An argument is semantically unusable (e.g. a renumber step that
    /// produces a negative counter).
    #[display("invalid argument: {_0}")]
    Invalid(#[error(not(source))] String),
}

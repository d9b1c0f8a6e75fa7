//! Error types for the content cache.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a cache failure.
///
/// A failed dimension probe is *not* an error; the decoder falls back to
/// the kind's fixed size estimate and carries on.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Reading the file's bytes from the storage backend failed.
    Storage,
    /// The requested index does not exist in the collection.
    Collection,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Storage => true,
            ErrorKind::Collection => false,
        }
    }
}

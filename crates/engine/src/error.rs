//! Error types for the rename engine.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//!
//! Per-record failures (a rename or timestamp write that goes wrong) are not
//! errors at this level — they become flags on the affected record. Only
//! failures that invalidate the whole save, such as being unable to create
//! the trash directory, surface here.

use derive_more::{Display, Error};

/// An engine error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a fatal save failure.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A storage backend operation the whole batch depends on failed.
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Storage => true,
        }
    }
}

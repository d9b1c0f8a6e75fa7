//! Error types for backend operations.
//!
//! Built on `exn` so every raised error carries the location it came from
//! and can be nested into an error tree by the crates above this one.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong, phrased so the caller knows whether to retry,
/// surface the problem to the user, or give up on the file.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The named file is not in the managed directory
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The filesystem refused the operation (permissions, read-only mount)
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains invalid characters or escapes the media directory
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Backend-specific failure that fits none of the above
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}

impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::BackendError(_))
    }
}

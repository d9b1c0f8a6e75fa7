//! Configuration error types, using `exn` for automatic location tracking.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a configuration failure.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The layered providers could not be merged or deserialized (malformed
    /// TOML, wrong value type in an environment variable).
    #[display("could not extract configuration")]
    Extract,
    /// A configured value is syntactically fine but semantically unusable
    /// (e.g. a counter position of zero).
    #[display("invalid configuration value: {_0}")]
    Invalid(#[error(not(source))] String),
}

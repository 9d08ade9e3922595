//! Error type shared by the map and the codec.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by map operations and by encoding/decoding.
#[derive(Error, Debug)]
pub enum Error {
    /// `remove_first`/`remove_last` on an empty map.
    #[error("no such element")]
    NoSuchElement,

    /// Positional access past the end of the map.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The requested position
        index: usize,
        /// Number of entries at the time of the call
        len: usize,
    },

    /// A constructor or operation argument outside its valid domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Cursor mutation without a preceding `next`/`previous`.
    #[error("cursor has no current entry")]
    NoCurrentEntry,

    /// A tag byte that names no value kind.
    #[error("malformed stream: unknown tag {0}")]
    UnknownTag(u8),

    /// The stream ended before a declared length was satisfied.
    #[error("malformed stream: truncated")]
    Truncated,

    /// Structurally invalid input (bad UTF-16, negative length, null key, ...).
    #[error("malformed stream: {0}")]
    Malformed(String),

    /// A blob whose type name has no registered decoder.
    #[error("malformed stream: no decoder registered for blob type `{0}`")]
    UnknownBlobType(String),

    /// Nesting of maps/lists deeper than the configured limit.
    #[error("nesting depth exceeds limit of {0}")]
    DepthLimitExceeded(usize),

    /// The blob serializer failed.
    #[error("blob serialization failed: {0}")]
    Serialization(String),

    /// Underlying reader/writer failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

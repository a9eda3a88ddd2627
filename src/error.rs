//! Error types surfaced by the log, index file, and entry cache.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("index {0} out of range")]
    OutOfRange(u64),

    #[error("fatal: {0}")]
    Fatal(String),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::Malformed(msg.into())
    }
}

/// Error returned by [`crate::cache::EntryCache`] operations. Kept separate from
/// [`Error`] because cache inconsistency is a programmer error on the caller's
/// part (an out-of-lockstep index), not an I/O or format failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheRangeError;

impl fmt::Display for CacheRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "requested index is outside the cache's held range")
    }
}

impl std::error::Error for CacheRangeError {}

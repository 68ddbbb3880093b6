//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The metadata store could not be opened or queried in time: the owning
    /// application holds a lock, the file is not a Calibre database, or the
    /// connect timeout elapsed. Treat the library as empty for now.
    #[display("metadata store unavailable: {}", _0.display())]
    StoreUnavailable(#[error(not(source))] PathBuf),
    /// A row was missing a field that every record needs. Only that row is
    /// affected.
    #[display("malformed record: missing {_0}")]
    MalformedRecord(#[error(not(source))] &'static str),
    /// A library must be identified by an absolute path.
    #[display("invalid library path: {}", _0.display())]
    InvalidLibrary(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

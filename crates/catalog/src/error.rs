//! Catalog Error Types
//!
//! Browsing never fails: discovery and listing problems are degraded to
//! empty results inside the catalog. The kinds below surface only from the
//! launch boundary, dictionary lookups and installing filesystem monitors.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A legacy config artifact is missing, unreadable or malformed. Never
    /// leaves the scanner: the artifact contributes no libraries.
    #[display("config artifact unavailable: {}", _0.display())]
    ConfigUnavailable(#[error(not(source))] PathBuf),
    /// The filesystem watcher could not be installed. The node falls back to
    /// being refreshed on every access.
    #[display("could not monitor {}", _0.display())]
    Monitor(#[error(not(source))] PathBuf),
    /// A dictionary's index or article data could not be read.
    #[display("dictionary unreadable: {}", _0.display())]
    Dictionary(#[error(not(source))] PathBuf),
    /// The file extension is not a recognized e-book format.
    #[display("unsupported e-book format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// The external program could not be found or started.
    #[display("could not launch {_0}")]
    Launch(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConfigUnavailable(_) | Self::Monitor(_))
    }
}

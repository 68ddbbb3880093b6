//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A config error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The layered settings could not be extracted (bad TOML, wrong types,
    /// unparseable environment variable).
    #[display("invalid configuration")]
    Invalid,
    /// Neither an explicit setting nor the environment yielded a usable
    /// directory, and the platform has no notion of a home directory.
    #[display("could not determine directory: {_0}")]
    NoDirectory(#[error(not(source))] &'static str),
    #[display("configuration file not found: {}", _0.display())]
    FileNotFound(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

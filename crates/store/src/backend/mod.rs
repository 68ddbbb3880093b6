//! Metadata backend trait and implementations.
//!
//! A backend answers the fixed query shapes for any [`Library`] it is handed.
//! Every method returns a lazy stream that does no work until polled, and
//! every call starts from scratch: nothing is cached between two listings of
//! the same library.

#[cfg(any(test, feature = "mock"))]
mod mock;
mod sqlite;

#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockBackend, MockBook, MockLibrary};
pub use self::sqlite::SqliteBackend;
use crate::error::Result;
use crate::models::{AuthorRecord, BookRecord, FormatRecord, Library, SeriesRecord};
use futures::Stream;
use std::pin::Pin;

/// Lazy sequence of records. Finite, and not restartable: call the backend
/// again for a fresh listing.
pub type RecordStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'static>>;

/// Which books a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookScope {
    All,
    /// Books linked to the author id through `books_authors_link`.
    Author(i64),
    /// Books linked to the series id through `books_series_link`.
    Series(i64),
}

/// Read-only view over the metadata stores of any number of libraries.
///
/// # Contract
/// - A library without a metadata store lists nothing, without error.
/// - A store that cannot be reached in time yields a single
///   [`StoreUnavailable`](crate::error::ErrorKind::StoreUnavailable) and ends.
/// - Rows missing required fields are skipped.
/// - Books without any format are never listed.
pub trait MetadataBackend: Send + Sync {
    /// Name used for logging.
    fn name(&self) -> &str;

    /// Books ordered by (sort, default format tag, id).
    fn books(&self, library: &Library, scope: BookScope) -> RecordStream<BookRecord>;

    /// Authors ordered by sort name, then id.
    fn authors(&self, library: &Library) -> RecordStream<AuthorRecord>;

    /// Series ordered by sort name, then id.
    fn series(&self, library: &Library) -> RecordStream<SeriesRecord>;

    /// Stored formats of one book, ordered by tag.
    fn formats(&self, library: &Library, book: i64) -> RecordStream<FormatRecord>;
}

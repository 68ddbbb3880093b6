//! In-memory metadata backend for testing.

use super::{BookScope, MetadataBackend, RecordStream};
use crate::error::ErrorKind;
use crate::models::{AuthorRecord, BookRecord, FormatRecord, Library, NamedRecord, SeriesRecord};
use crate::selector::{add_format, compare_books, compare_named, is_listable};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// A book as a test describes it: its formats plus the author/series ids it
/// is linked to.
#[derive(Debug, Clone, Default)]
pub struct MockBook {
    pub id: i64,
    pub sort: String,
    pub author_sort: String,
    pub path: String,
    pub formats: Vec<FormatRecord>,
    pub authors: Vec<i64>,
    pub series: Vec<i64>,
}
impl MockBook {
    /// Book with one stored file per `tag`, all named after `sort`.
    pub fn new(id: i64, sort: impl Into<String>, tags: &[&str]) -> Self {
        let sort = sort.into();
        Self {
            id,
            path: format!("{sort} ({id})"),
            formats: tags.iter().map(|tag| FormatRecord::new(tag.to_uppercase(), sort.clone())).collect(),
            sort,
            ..Self::default()
        }
    }

    pub fn by(mut self, author: i64) -> Self {
        self.authors.push(author);
        self
    }

    pub fn in_series(mut self, series: i64) -> Self {
        self.series.push(series);
        self
    }

    fn record(&self) -> BookRecord {
        let mut book = BookRecord {
            id: self.id,
            sort: self.sort.clone(),
            author_sort: self.author_sort.clone(),
            path: self.path.clone(),
            default_format: None,
            format_count: 0,
        };
        for format in &self.formats {
            add_format(&mut book, format.clone());
        }
        book
    }

    fn in_scope(&self, scope: BookScope) -> bool {
        match scope {
            BookScope::All => true,
            BookScope::Author(id) => self.authors.contains(&id),
            BookScope::Series(id) => self.series.contains(&id),
        }
    }
}

/// Contents of one library's metadata store.
#[derive(Debug, Clone, Default)]
pub struct MockLibrary {
    pub books: Vec<MockBook>,
    pub authors: Vec<AuthorRecord>,
    pub series: Vec<SeriesRecord>,
}
impl MockLibrary {
    pub fn with_books(books: impl IntoIterator<Item = MockBook>) -> Self {
        Self { books: books.into_iter().collect(), ..Self::default() }
    }

    pub fn author(mut self, id: i64, name: &str, sort: &str) -> Self {
        self.authors.push(NamedRecord { id, name: name.to_string(), sort: sort.to_string() });
        self
    }

    pub fn series(mut self, id: i64, name: &str) -> Self {
        self.series.push(NamedRecord { id, name: name.to_string(), sort: name.to_string() });
        self
    }
}

/// In-memory metadata backend for testing.
///
/// Libraries are keyed by path. A library the mock knows nothing about
/// behaves like a library without a metadata store: every listing is empty.
/// Every listing call is counted, so tests can observe whether a catalog
/// re-queried the store.
#[derive(Debug, Default)]
pub struct MockBackend {
    libraries: RwLock<HashMap<PathBuf, MockLibrary>>,
    unavailable: RwLock<HashSet<PathBuf>>,
    calls: AtomicUsize,
}
impl MockBackend {
    pub fn with_libraries(libraries: impl IntoIterator<Item = (impl Into<PathBuf>, MockLibrary)>) -> Self {
        let map = libraries.into_iter().map(|(path, library)| (path.into(), library)).collect();
        Self { libraries: RwLock::new(map), ..Self::default() }
    }

    /// Replace (or add) the contents of the library at `path`.
    pub fn set_library(&self, path: impl Into<PathBuf>, library: MockLibrary) {
        self.libraries.write().unwrap_or_else(PoisonError::into_inner).insert(path.into(), library);
    }

    /// Make every listing of the library at `path` fail as if its store were
    /// locked.
    pub fn set_unavailable(&self, path: impl Into<PathBuf>, unavailable: bool) {
        let mut guard = self.unavailable.write().unwrap_or_else(PoisonError::into_inner);
        if unavailable {
            guard.insert(path.into());
        } else {
            guard.remove(&path.into());
        }
    }

    /// Number of listing calls made so far, across all libraries.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn listing<T: Send + 'static>(&self, path: &Path, list: impl FnOnce(&MockLibrary) -> Vec<T>) -> RecordStream<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.read().unwrap_or_else(PoisonError::into_inner).contains(path) {
            let file = path.join(folio_config::calibre::METADATA_FILE);
            return Box::pin(futures::stream::iter([Err(exn::Exn::from(ErrorKind::StoreUnavailable(file)))]));
        }
        let items = self
            .libraries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .map(list)
            .unwrap_or_default();
        Box::pin(futures::stream::iter(items.into_iter().map(Ok)))
    }
}
impl MetadataBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn books(&self, library: &Library, scope: BookScope) -> RecordStream<BookRecord> {
        self.listing(library.path(), |lib| {
            let mut books: Vec<_> =
                lib.books.iter().filter(|b| b.in_scope(scope)).map(MockBook::record).filter(is_listable).collect();
            books.sort_by(compare_books);
            books
        })
    }

    fn authors(&self, library: &Library) -> RecordStream<AuthorRecord> {
        self.listing(library.path(), |lib| {
            let mut authors = lib.authors.clone();
            authors.sort_by(compare_named);
            authors
        })
    }

    fn series(&self, library: &Library) -> RecordStream<SeriesRecord> {
        self.listing(library.path(), |lib| {
            let mut series = lib.series.clone();
            series.sort_by(compare_named);
            series
        })
    }

    fn formats(&self, library: &Library, book: i64) -> RecordStream<FormatRecord> {
        self.listing(library.path(), |lib| {
            let mut formats: Vec<_> =
                lib.books.iter().filter(|b| b.id == book).flat_map(|b| b.formats.iter().cloned()).collect();
            formats.sort_by(|a, b| a.format.cmp(&b.format));
            formats
        })
    }
}

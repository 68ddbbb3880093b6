use crate::backend::{BookScope, RecordStream};
use crate::models::{AuthorRecord, BookRecord, FormatRecord, Library, SeriesRecord};
use crate::BackendHandle;

/// One library's metadata, as seen through a backend.
///
/// Cheap to clone and to create: it holds no connection. Each listing opens
/// its own.
#[derive(Clone)]
pub struct MetadataStore {
    backend: BackendHandle,
    library: Library,
}
impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("backend", &self.backend.name())
            .field("library", &self.library)
            .finish()
    }
}
impl MetadataStore {
    pub fn new(backend: BackendHandle, library: Library) -> Self {
        Self { backend, library }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn list_books(&self) -> RecordStream<BookRecord> {
        self.backend.books(&self.library, BookScope::All)
    }

    pub fn list_books_by_author(&self, author: i64) -> RecordStream<BookRecord> {
        self.backend.books(&self.library, BookScope::Author(author))
    }

    pub fn list_books_by_series(&self, series: i64) -> RecordStream<BookRecord> {
        self.backend.books(&self.library, BookScope::Series(series))
    }

    pub fn list_authors(&self) -> RecordStream<AuthorRecord> {
        self.backend.authors(&self.library)
    }

    pub fn list_series(&self) -> RecordStream<SeriesRecord> {
        self.backend.series(&self.library)
    }

    pub fn list_formats(&self, book: i64) -> RecordStream<FormatRecord> {
        self.backend.formats(&self.library, book)
    }
}

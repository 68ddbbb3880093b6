//! Calibre `metadata.db` backend.

use super::{BookScope, MetadataBackend, RecordStream};
use crate::db;
use crate::models::{AuthorRecord, BookRecord, FormatRecord, Library, SeriesRecord};
use folio_config::CalibreSettings;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Opens each library's `metadata.db` read-only, once per listing.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    timeout: Duration,
}
impl Default for SqliteBackend {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}
impl SqliteBackend {
    /// `timeout` bounds both the connect and any wait on a locked store.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_settings(settings: &CalibreSettings) -> Self {
        Self::new(settings.connect_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
impl MetadataBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn books(&self, library: &Library, scope: BookScope) -> RecordStream<BookRecord> {
        debug!(library = %library, ?scope, "listing books");
        let file = library.metadata_file();
        match scope {
            BookScope::All => db::books(file, self.timeout, include_str!("../../queries/list_books.sql"), None),
            BookScope::Author(id) => {
                db::books(file, self.timeout, include_str!("../../queries/list_books_by_author.sql"), Some(id))
            },
            BookScope::Series(id) => {
                db::books(file, self.timeout, include_str!("../../queries/list_books_by_series.sql"), Some(id))
            },
        }
    }

    fn authors(&self, library: &Library) -> RecordStream<AuthorRecord> {
        debug!(library = %library, "listing authors");
        db::named(library.metadata_file(), self.timeout, include_str!("../../queries/list_authors.sql"))
    }

    fn series(&self, library: &Library) -> RecordStream<SeriesRecord> {
        debug!(library = %library, "listing series");
        db::named(library.metadata_file(), self.timeout, include_str!("../../queries/list_series.sql"))
    }

    fn formats(&self, library: &Library, book: i64) -> RecordStream<FormatRecord> {
        debug!(library = %library, book, "listing formats");
        db::formats(library.metadata_file(), self.timeout, include_str!("../../queries/list_formats.sql"), book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::TryStreamExt;
    use sqlx::ConnectOptions;
    use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
    use tempfile::TempDir;

    const SCHEMA: &str = r#"
        CREATE TABLE books (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL DEFAULT 'Unknown',
            sort TEXT,
            author_sort TEXT,
            path TEXT NOT NULL DEFAULT ''
        );
        CREATE TABLE data (
            id INTEGER PRIMARY KEY,
            book INTEGER NOT NULL,
            format TEXT NOT NULL,
            uncompressed_size INTEGER NOT NULL DEFAULT 0,
            name TEXT NOT NULL
        );
        CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT NOT NULL, sort TEXT, link TEXT NOT NULL DEFAULT '');
        CREATE TABLE series (id INTEGER PRIMARY KEY, name TEXT NOT NULL, sort TEXT);
        CREATE TABLE books_authors_link (id INTEGER PRIMARY KEY, book INTEGER NOT NULL, author INTEGER NOT NULL);
        CREATE TABLE books_series_link (id INTEGER PRIMARY KEY, book INTEGER NOT NULL, series INTEGER NOT NULL);
    "#;

    const FIXTURE: &str = r#"
        INSERT INTO books (id, sort, author_sort, path) VALUES
            (1, 'Alpha', 'Someone', 'Someone/Alpha (1)'),
            (2, 'Beta', 'Someone', 'Someone/Beta (2)'),
            (3, 'Colour of Magic, The', 'Pratchett, Terry', 'Terry Pratchett/The Colour of Magic (3)'),
            (4, 'Alpha', 'Other', 'Other/Alpha (4)'),
            (5, 'Mort', 'Pratchett, Terry', 'Terry Pratchett/Mort (5)');
        INSERT INTO data (book, format, name) VALUES
            (1, 'MOBI', 'Alpha - Someone'),
            (1, 'EPUB', 'Alpha - Someone'),
            (3, 'PDF', 'The Colour of Magic - Terry Pratchett'),
            (4, 'AZW3', 'Alpha - Other'),
            (5, 'EPUB', 'Mort - Terry Pratchett');
        INSERT INTO authors (id, name, sort) VALUES
            (1, 'Someone', 'Someone'),
            (2, 'Terry Pratchett', 'Pratchett, Terry'),
            (3, 'Iain Banks', NULL);
        INSERT INTO series (id, name, sort) VALUES
            (1, 'Discworld', 'Discworld'),
            (2, 'Culture', 'Culture');
        INSERT INTO books_authors_link (book, author) VALUES (1, 1), (2, 1), (3, 2), (5, 2), (4, 1);
        INSERT INTO books_series_link (book, series) VALUES (5, 1), (3, 1);
    "#;

    async fn create_store(dir: &TempDir) -> (Library, SqliteConnection) {
        let library = Library::new(dir.path()).unwrap();
        let mut conn = SqliteConnectOptions::new()
            .filename(library.metadata_file())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .connect()
            .await
            .unwrap();
        sqlx::raw_sql(SCHEMA).execute(&mut conn).await.unwrap();
        sqlx::raw_sql(FIXTURE).execute(&mut conn).await.unwrap();
        (library, conn)
    }

    fn backend() -> SqliteBackend {
        SqliteBackend::new(Duration::from_millis(250))
    }

    #[tokio::test]
    async fn books_are_ordered_and_formatless_books_skipped() {
        let dir = TempDir::new().unwrap();
        let (library, _conn) = create_store(&dir).await;
        let books: Vec<BookRecord> = backend().books(&library, BookScope::All).try_collect().await.unwrap();
        // "Alpha" twice: AZW3 (id 4) sorts before EPUB (id 1). Book 2 has no formats.
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![4, 1, 3, 5]);
        let alpha = &books[1];
        assert_eq!(alpha.format_count, 2);
        assert_eq!(alpha.default_format_file().as_deref(), Some("Alpha - Someone.epub"));
        assert_eq!(
            alpha.default_file(&library),
            Some(dir.path().join("Someone/Alpha (1)/Alpha - Someone.epub"))
        );
    }

    #[tokio::test]
    async fn authors_and_series_are_sorted_by_sort_name() {
        let dir = TempDir::new().unwrap();
        let (library, _conn) = create_store(&dir).await;
        let authors: Vec<AuthorRecord> = backend().authors(&library).try_collect().await.unwrap();
        let sorts: Vec<_> = authors.iter().map(|a| a.sort.as_str()).collect();
        assert_eq!(sorts, vec!["Iain Banks", "Pratchett, Terry", "Someone"]);
        let series: Vec<SeriesRecord> = backend().series(&library).try_collect().await.unwrap();
        assert_eq!(series.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["Culture", "Discworld"]);
    }

    #[tokio::test]
    async fn books_by_author_keep_listing_order() {
        let dir = TempDir::new().unwrap();
        let (library, _conn) = create_store(&dir).await;
        let books: Vec<BookRecord> = backend().books(&library, BookScope::Author(1)).try_collect().await.unwrap();
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![4, 1]);
        let books: Vec<BookRecord> = backend().books(&library, BookScope::Series(1)).try_collect().await.unwrap();
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 5]);
    }

    #[tokio::test]
    async fn formats_are_ordered_by_tag() {
        let dir = TempDir::new().unwrap();
        let (library, _conn) = create_store(&dir).await;
        let formats: Vec<FormatRecord> = backend().formats(&library, 1).try_collect().await.unwrap();
        assert_eq!(formats.iter().map(|f| f.format.as_str()).collect::<Vec<_>>(), vec!["EPUB", "MOBI"]);
        assert_eq!(formats[1].file_name(), "Alpha - Someone.mobi");
    }

    #[tokio::test]
    async fn missing_store_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(dir.path()).unwrap();
        let backend = backend();
        assert!(backend.books(&library, BookScope::All).try_collect::<Vec<_>>().await.unwrap().is_empty());
        assert!(backend.books(&library, BookScope::Author(1)).try_collect::<Vec<_>>().await.unwrap().is_empty());
        assert!(backend.authors(&library).try_collect::<Vec<_>>().await.unwrap().is_empty());
        assert!(backend.series(&library).try_collect::<Vec<_>>().await.unwrap().is_empty());
        assert!(backend.formats(&library, 1).try_collect::<Vec<_>>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn locked_store_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let (library, mut conn) = create_store(&dir).await;
        sqlx::raw_sql("BEGIN EXCLUSIVE").execute(&mut conn).await.unwrap();
        let backend = SqliteBackend::new(Duration::from_millis(100));
        let err = backend.books(&library, BookScope::All).try_collect::<Vec<_>>().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::StoreUnavailable(path) if path == &library.metadata_file()));
        assert!(err.is_retryable());
        sqlx::raw_sql("ROLLBACK").execute(&mut conn).await.unwrap();
    }

    #[tokio::test]
    async fn garbage_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(dir.path()).unwrap();
        std::fs::write(library.metadata_file(), b"this is not a database, not even close to one").unwrap();
        let err = backend().authors(&library).try_collect::<Vec<_>>().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::StoreUnavailable(_)));
    }
}

//! Read-only SQLite access to a library's `metadata.db`.
//!
//! The owning application may be running and holding locks at any time. We
//! never write, never create the file, and give up after the configured
//! timeout rather than block the caller.

use crate::backend::RecordStream;
use crate::error::{ErrorKind, Result};
use crate::models::{BookRecord, BookRow, FormatRecord, FormatRow, NamedRecord, NamedRow};
use crate::selector::BookAssembler;
use async_stream::stream;
use exn::ResultExt;
use futures::StreamExt;
use sqlx::ConnectOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

/// Open `file` read-only.
///
/// Returns `Ok(None)` when the file does not exist: a library whose store has
/// gone away is simply empty.
#[instrument(level = "debug", skip(timeout))]
pub(crate) async fn connect(file: &Path, timeout: Duration) -> Result<Option<SqliteConnection>> {
    if !file.is_file() {
        debug!(file = %file.display(), "metadata store does not exist");
        return Ok(None);
    }
    let options = SqliteConnectOptions::new()
        .filename(file)
        .read_only(true)
        .create_if_missing(false)
        // SQLITE_BUSY after this long; the application holds write locks
        // while it updates the library.
        .busy_timeout(timeout);
    let unavailable = || ErrorKind::StoreUnavailable(file.to_path_buf());
    let conn = tokio::time::timeout(timeout, options.connect())
        .await
        .or_raise(unavailable)?
        .or_raise(unavailable)?;
    Ok(Some(conn))
}

/// Stream fully assembled books from one of the `list_books*` queries.
pub(crate) fn books(file: PathBuf, timeout: Duration, sql: &'static str, bind: Option<i64>) -> RecordStream<BookRecord> {
    Box::pin(stream!({
        let mut conn = match connect(&file, timeout).await {
            Ok(Some(conn)) => conn,
            Ok(None) => return,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let mut query = sqlx::query_as::<_, BookRow>(sql);
        if let Some(id) = bind {
            query = query.bind(id);
        }
        let mut rows = query.fetch(&mut conn);
        let mut assembler = BookAssembler::default();
        while let Some(row) = rows.next().await {
            let row = match row.or_raise(|| ErrorKind::StoreUnavailable(file.clone())) {
                Ok(row) => row,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            let id = row.id;
            match <(BookRecord, Option<FormatRecord>)>::try_from(row) {
                Ok((book, format)) => {
                    for book in assembler.push(book, format) {
                        yield Ok(book);
                    }
                },
                Err(e) => debug!(book = id, error = ?e, "skipping malformed book row"),
            }
        }
        for book in assembler.finish() {
            yield Ok(book);
        }
    }))
}

/// Stream authors or series.
pub(crate) fn named(file: PathBuf, timeout: Duration, sql: &'static str) -> RecordStream<NamedRecord> {
    Box::pin(stream!({
        let mut conn = match connect(&file, timeout).await {
            Ok(Some(conn)) => conn,
            Ok(None) => return,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let mut rows = sqlx::query_as::<_, NamedRow>(sql).fetch(&mut conn);
        while let Some(row) = rows.next().await {
            let row = match row.or_raise(|| ErrorKind::StoreUnavailable(file.clone())) {
                Ok(row) => row,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            let id = row.id;
            match NamedRecord::try_from(row) {
                Ok(record) => {
                    yield Ok(record);
                },
                Err(e) => debug!(id, error = ?e, "skipping malformed row"),
            }
        }
    }))
}

/// Stream the formats of one book, ordered by tag.
pub(crate) fn formats(file: PathBuf, timeout: Duration, sql: &'static str, book: i64) -> RecordStream<FormatRecord> {
    Box::pin(stream!({
        let mut conn = match connect(&file, timeout).await {
            Ok(Some(conn)) => conn,
            Ok(None) => return,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let mut rows = sqlx::query_as::<_, FormatRow>(sql).bind(book).fetch(&mut conn);
        while let Some(row) = rows.next().await {
            let row = match row.or_raise(|| ErrorKind::StoreUnavailable(file.clone())) {
                Ok(row) => row,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            match FormatRecord::try_from(row) {
                Ok(format) => {
                    yield Ok(format);
                },
                Err(e) => debug!(book, error = ?e, "skipping malformed format row"),
            }
        }
    }))
}

//! Raw query rows.
//!
//! Calibre's schema allows NULL almost everywhere, so every column is decoded
//! as an `Option` and validated when converting into a record. A failed
//! conversion is a [`MalformedRecord`](ErrorKind::MalformedRecord): the row is
//! skipped, the query carries on.

use crate::error::{Error, ErrorKind};
use crate::models::{BookRecord, FormatRecord, NamedRecord};
use exn::OptionExt;

/// One row of `books LEFT JOIN data`: a book plus at most one of its formats.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: i64,
    pub(crate) sort: Option<String>,
    pub(crate) author_sort: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) format: Option<String>,
    pub(crate) name: Option<String>,
}
impl TryFrom<BookRow> for (BookRecord, Option<FormatRecord>) {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let format = match (row.format, row.name) {
            (Some(format), Some(name)) => Some(FormatRecord::new(format, name)),
            (None, None) => None,
            _ => exn::bail!(ErrorKind::MalformedRecord("format name")),
        };
        let book = BookRecord {
            id: row.id,
            sort: row.sort.ok_or_raise(|| ErrorKind::MalformedRecord("sort"))?,
            author_sort: row.author_sort.unwrap_or_default(),
            path: row.path.ok_or_raise(|| ErrorKind::MalformedRecord("path"))?,
            default_format: None,
            format_count: 0,
        };
        Ok((book, format))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct NamedRow {
    pub(crate) id: i64,
    pub(crate) name: Option<String>,
    pub(crate) sort: Option<String>,
}
impl TryFrom<NamedRow> for NamedRecord {
    type Error = Error;
    fn try_from(row: NamedRow) -> Result<Self, Self::Error> {
        let name = row.name.ok_or_raise(|| ErrorKind::MalformedRecord("name"))?;
        let sort = row.sort.unwrap_or_else(|| name.clone());
        Ok(Self { id: row.id, name, sort })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FormatRow {
    pub(crate) format: Option<String>,
    pub(crate) name: Option<String>,
}
impl TryFrom<FormatRow> for FormatRecord {
    type Error = Error;
    fn try_from(row: FormatRow) -> Result<Self, Self::Error> {
        Ok(Self::new(
            row.format.ok_or_raise(|| ErrorKind::MalformedRecord("format"))?,
            row.name.ok_or_raise(|| ErrorKind::MalformedRecord("format name"))?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(format: Option<&str>, name: Option<&str>) -> BookRow {
        BookRow {
            id: 1,
            sort: Some("Alpha".to_string()),
            author_sort: None,
            path: Some("Author/Alpha (1)".to_string()),
            format: format.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn book_without_formats_converts() {
        let (book, format) = <(BookRecord, Option<FormatRecord>)>::try_from(row(None, None)).unwrap();
        assert_eq!(book.author_sort, "");
        assert!(format.is_none());
    }

    #[test]
    fn half_a_format_is_malformed() {
        let err = <(BookRecord, Option<FormatRecord>)>::try_from(row(Some("EPUB"), None)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedRecord(_)));
    }

    #[test]
    fn missing_sort_is_malformed() {
        let mut row = row(Some("EPUB"), Some("Alpha"));
        row.sort = None;
        assert!(<(BookRecord, Option<FormatRecord>)>::try_from(row).is_err());
    }

    #[test]
    fn named_sort_falls_back_to_name() {
        let record = NamedRecord::try_from(NamedRow { id: 3, name: Some("Discworld".to_string()), sort: None }).unwrap();
        assert_eq!(record.sort, "Discworld");
    }
}

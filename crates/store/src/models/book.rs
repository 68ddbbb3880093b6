use std::path::{Path, PathBuf};

/// One stored file of a book, as recorded in the `data` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatRecord {
    /// Upper-case format tag as Calibre stores it (`EPUB`, `MOBI`, ...).
    pub format: String,
    /// File stem inside the book's directory.
    pub stored_name: String,
}
impl FormatRecord {
    pub fn new(format: impl Into<String>, stored_name: impl Into<String>) -> Self {
        Self { format: format.into(), stored_name: stored_name.into() }
    }

    /// `{stored_name}.{lower(format)}`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stored_name, self.format.to_lowercase())
    }
}

/// A book as listed by the metadata store.
///
/// Only books with at least one format are ever listed, so `default_format`
/// is `Some` for every record handed out by a listing. The field stays an
/// `Option` because the record is assembled row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub id: i64,
    /// Title sort key (`books.sort`).
    pub sort: String,
    pub author_sort: String,
    /// Book directory relative to the library root (`books.path`).
    pub path: String,
    pub default_format: Option<FormatRecord>,
    pub format_count: u32,
}
impl BookRecord {
    pub fn default_format_file(&self) -> Option<String> {
        self.default_format.as_ref().map(FormatRecord::file_name)
    }

    /// Absolute directory of this book inside `library`.
    pub fn directory(&self, library: impl AsRef<Path>) -> PathBuf {
        library.as_ref().join(&self.path)
    }

    /// Absolute path of the default format file, the file "open this book"
    /// acts on.
    pub fn default_file(&self, library: impl AsRef<Path>) -> Option<PathBuf> {
        self.default_format_file().map(|file| self.directory(library).join(file))
    }
}

/// An author or series row; both tables share the `(id, name, sort)` shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedRecord {
    pub id: i64,
    pub name: String,
    pub sort: String,
}
pub type AuthorRecord = NamedRecord;
pub type SeriesRecord = NamedRecord;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("EPUB", "Dune - Frank Herbert", "Dune - Frank Herbert.epub")]
    #[case("MOBI", "x", "x.mobi")]
    #[case("ORIGINAL_EPUB", "x", "x.original_epub")]
    fn format_file_name(#[case] format: &str, #[case] stored: &str, #[case] expected: &str) {
        assert_eq!(FormatRecord::new(format, stored).file_name(), expected);
    }

    #[test]
    fn default_file_is_inside_book_directory() {
        let book = BookRecord {
            id: 7,
            sort: "Dune".to_string(),
            author_sort: "Herbert, Frank".to_string(),
            path: "Frank Herbert/Dune (7)".to_string(),
            default_format: Some(FormatRecord::new("EPUB", "Dune - Frank Herbert")),
            format_count: 1,
        };
        assert_eq!(
            book.default_file("/lib"),
            Some(PathBuf::from("/lib/Frank Herbert/Dune (7)/Dune - Frank Herbert.epub"))
        );
    }
}

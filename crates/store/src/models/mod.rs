mod book;
mod library;
mod row;

pub use self::book::{AuthorRecord, BookRecord, FormatRecord, NamedRecord, SeriesRecord};
pub use self::library::Library;
pub(crate) use self::row::{BookRow, FormatRow, NamedRow};

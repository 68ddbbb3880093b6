//! Deterministic tie-break rules.
//!
//! A Calibre book can have several stored formats, but a launcher needs one
//! file to open. The rule is simple and must never drift: **the format with
//! the lexicographically lowest tag wins** (`EPUB` beats `MOBI` beats `PDF`).
//! Anything that "opens a book" relies on this picking the same file every
//! time for the same data.
//!
//! Ordering rules:
//!
//! | Listing              | Order                                      |
//! |----------------------|--------------------------------------------|
//! | books                | `sort`, then default format tag, then `id` |
//! | authors / series     | `sort`, then `id`                          |
//! | ... across libraries | `sort`, then library path, then `id`       |
//! | formats of a book    | tag                                        |
//!
//! Everything in here is pure; the store feeds it rows.

use crate::models::{BookRecord, FormatRecord, Library, NamedRecord};
use std::cmp::Ordering;

/// The format a book opens with: lowest tag, first one on ties.
pub fn default_format<'a>(formats: impl IntoIterator<Item = &'a FormatRecord>) -> Option<&'a FormatRecord> {
    formats.into_iter().min_by(|a, b| a.format.cmp(&b.format))
}

/// Books without any format are never listed.
pub fn is_listable(book: &BookRecord) -> bool {
    book.format_count > 0 && book.default_format.is_some()
}

/// Count `format` against `book` and keep it as the default if it sorts
/// below the current one.
pub fn add_format(book: &mut BookRecord, format: FormatRecord) {
    book.format_count += 1;
    if book.default_format.as_ref().is_none_or(|current| format.format < current.format) {
        book.default_format = Some(format);
    }
}

pub fn compare_books(a: &BookRecord, b: &BookRecord) -> Ordering {
    let tag = |book: &BookRecord| book.default_format.as_ref().map(|f| f.format.clone());
    a.sort.cmp(&b.sort).then_with(|| tag(a).cmp(&tag(b))).then(a.id.cmp(&b.id))
}

pub fn compare_named(a: &NamedRecord, b: &NamedRecord) -> Ordering {
    a.sort.cmp(&b.sort).then(a.id.cmp(&b.id))
}

/// Authors or series from several libraries: `sort`, then library path,
/// then `id`. Ids are only unique within one library.
pub fn compare_named_across(a: (&Library, &NamedRecord), b: (&Library, &NamedRecord)) -> Ordering {
    a.1.sort.cmp(&b.1.sort).then_with(|| a.0.cmp(b.0)).then_with(|| compare_named(a.1, b.1))
}

/// Folds joined `(book, format)` rows into [`BookRecord`]s while keeping the
/// listing lazy.
///
/// Rows must arrive ordered by `(sort, id, format)`, which is what the store
/// queries produce. The final order also depends on each book's default
/// format, which is only known once all of its rows have been seen, so books
/// are held back until the `sort` key changes. Memory use is bounded by the
/// largest group of books sharing one sort key.
#[derive(Debug, Default)]
pub struct BookAssembler {
    current: Option<BookRecord>,
    bucket: Vec<BookRecord>,
}
impl BookAssembler {
    /// Feed one row. Returns the books whose position is now settled, in
    /// listing order (usually none or one bucket).
    pub fn push(&mut self, book: BookRecord, format: Option<FormatRecord>) -> Vec<BookRecord> {
        let mut settled = Vec::new();
        let same_book = self.current.as_ref().is_some_and(|current| current.id == book.id);
        if !same_book && let Some(done) = self.current.replace(book) {
            settled = self.complete(done);
        }
        if let (Some(current), Some(format)) = (self.current.as_mut(), format) {
            add_format(current, format);
        }
        settled
    }

    /// Settle everything still held back.
    pub fn finish(mut self) -> Vec<BookRecord> {
        let mut settled = match self.current.take() {
            Some(done) => self.complete(done),
            None => Vec::new(),
        };
        settled.extend(self.flush());
        settled
    }

    fn complete(&mut self, book: BookRecord) -> Vec<BookRecord> {
        if !is_listable(&book) {
            return Vec::new();
        }
        let settled = match self.bucket.last() {
            Some(last) if last.sort != book.sort => self.flush(),
            _ => Vec::new(),
        };
        self.bucket.push(book);
        settled
    }

    fn flush(&mut self) -> Vec<BookRecord> {
        let mut bucket = std::mem::take(&mut self.bucket);
        bucket.sort_by(compare_books);
        bucket
    }
}

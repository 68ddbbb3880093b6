//! Catalog tree nodes.
//!
//! A [`CatalogNode`] is a plain value describing *what* to list, never the
//! listing itself. Nodes refer to their library and records by value (path
//! and ids), so a node kept around after the store changed still identifies
//! the same thing and keeps no stale tree alive.

use crate::sources::{Dictionary, Profile};
use folio_store::{AuthorRecord, BookRecord, FormatRecord, Library, SeriesRecord};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum CatalogNode {
    /// Everything Calibre: all books, all authors, all series, every library.
    Root,
    /// Just the discovered libraries, e.g. to pick an "add to library" target.
    LibraryList,
    /// Books of every library, in discovery order.
    AllBooks,
    Library(Library),
    /// Authors of one library, or of every library when `library` is `None`.
    Authors { library: Option<Library> },
    /// Series of one library, or of every library when `library` is `None`.
    Series { library: Option<Library> },
    Author { library: Library, author: AuthorRecord },
    SeriesEntry { library: Library, series: SeriesRecord },
    Book { library: Library, book: BookRecord },
    /// One stored file of a book.
    Format { library: Library, book: i64, path: PathBuf, format: FormatRecord },
    Profiles,
    Profile(Profile),
    Dictionaries,
    Dictionary(Dictionary),
    /// `word` looked up in one dictionary.
    Lookup { dictionary: Dictionary, word: String },
    /// One line of a looked-up article.
    Translation { dictionary: Dictionary, word: String, text: String },
}

/// Identity of a node: which thing it lists, independent of the data it was
/// built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Root,
    LibraryList,
    AllBooks,
    Library(PathBuf),
    Authors(Option<PathBuf>),
    Series(Option<PathBuf>),
    Author(PathBuf, i64),
    SeriesEntry(PathBuf, i64),
    Book(PathBuf, i64),
    Format(PathBuf, i64, String),
    Profiles,
    Profile(PathBuf),
    Dictionaries,
    Dictionary(PathBuf),
    Lookup(PathBuf, String),
    Translation(PathBuf, String, String),
}

/// What kind of node a content provider produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Branch,
    Library,
    Author,
    SeriesEntry,
    Book,
    Format,
    Profile,
    Dictionary,
    Translation,
}

impl CatalogNode {
    pub fn key(&self) -> NodeKey {
        let path = |library: &Library| library.path().to_path_buf();
        match self {
            Self::Root => NodeKey::Root,
            Self::LibraryList => NodeKey::LibraryList,
            Self::AllBooks => NodeKey::AllBooks,
            Self::Library(library) => NodeKey::Library(path(library)),
            Self::Authors { library } => NodeKey::Authors(library.as_ref().map(path)),
            Self::Series { library } => NodeKey::Series(library.as_ref().map(path)),
            Self::Author { library, author } => NodeKey::Author(path(library), author.id),
            Self::SeriesEntry { library, series } => NodeKey::SeriesEntry(path(library), series.id),
            Self::Book { library, book } => NodeKey::Book(path(library), book.id),
            Self::Format { library, book, format, .. } => NodeKey::Format(path(library), *book, format.format.clone()),
            Self::Profiles => NodeKey::Profiles,
            Self::Profile(profile) => NodeKey::Profile(profile.path.clone()),
            Self::Dictionaries => NodeKey::Dictionaries,
            Self::Dictionary(dictionary) => NodeKey::Dictionary(dictionary.path.clone()),
            Self::Lookup { dictionary, word } => NodeKey::Lookup(dictionary.path.clone(), word.clone()),
            Self::Translation { dictionary, word, text } => {
                NodeKey::Translation(dictionary.path.clone(), word.clone(), text.clone())
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Library(_) => NodeKind::Library,
            Self::Author { .. } => NodeKind::Author,
            Self::SeriesEntry { .. } => NodeKind::SeriesEntry,
            Self::Book { .. } => NodeKind::Book,
            Self::Format { .. } => NodeKind::Format,
            Self::Profile(_) => NodeKind::Profile,
            Self::Dictionary(_) => NodeKind::Dictionary,
            Self::Translation { .. } => NodeKind::Translation,
            Self::Root
            | Self::LibraryList
            | Self::AllBooks
            | Self::Authors { .. }
            | Self::Series { .. }
            | Self::Profiles
            | Self::Dictionaries
            | Self::Lookup { .. } => NodeKind::Branch,
        }
    }

    /// The library this node is bound to, if any.
    pub fn library(&self) -> Option<&Library> {
        match self {
            Self::Library(library)
            | Self::Author { library, .. }
            | Self::SeriesEntry { library, .. }
            | Self::Book { library, .. }
            | Self::Format { library, .. } => Some(library),
            Self::Authors { library } | Self::Series { library } => library.as_ref(),
            _ => None,
        }
    }

    /// Display name. Authors, series and books are named by their sort key,
    /// which is what users type to find them.
    pub fn name(&self) -> String {
        match self {
            Self::Root => "Calibre Libraries".to_string(),
            Self::LibraryList => "Libraries".to_string(),
            Self::AllBooks => "Calibre Books".to_string(),
            Self::Library(library) => library.name(),
            Self::Authors { .. } => "Calibre Authors".to_string(),
            Self::Series { .. } => "Calibre Series".to_string(),
            Self::Author { author: record, .. } | Self::SeriesEntry { series: record, .. } => record.sort.clone(),
            Self::Book { book, .. } => book.sort.clone(),
            Self::Format { format, .. } => format.file_name(),
            Self::Profiles => "Unison Profiles".to_string(),
            Self::Profile(profile) => profile.name.clone(),
            Self::Dictionaries => "StarDict Dictionaries".to_string(),
            Self::Dictionary(dictionary) => dictionary.name.clone(),
            Self::Lookup { dictionary, .. } => format!("Lookup into {}", dictionary.name),
            Self::Translation { text, .. } => text.clone(),
        }
    }

    /// Extra names the node can be found by.
    pub fn aliases(&self) -> Vec<String> {
        match self {
            Self::Author { author: record, .. } | Self::SeriesEntry { series: record, .. } if record.name != record.sort => {
                vec![record.name.clone()]
            },
            Self::Book { library, book } => vec![book.directory(library).display().to_string()],
            _ => Vec::new(),
        }
    }

    pub fn description(&self) -> Option<String> {
        match self {
            Self::Root => Some("Calibre libraries, books, authors and series".to_string()),
            Self::AllBooks => Some("All Calibre Books".to_string()),
            Self::Library(library) => Some(format!("Library: {library}")),
            Self::Authors { library: Some(library) } | Self::Series { library: Some(library) } => {
                Some(format!("Calibre Library {}", library.name()))
            },
            Self::Author { library, .. } | Self::SeriesEntry { library, .. } => Some(library.name()),
            Self::Book { book, .. } => Some(book.author_sort.clone()).filter(|a| !a.is_empty()),
            Self::Format { format, .. } => Some(format.format.clone()),
            Self::Profile(profile) => Some(profile.path.display().to_string()),
            Self::Dictionary(dictionary) => Some(dictionary.path.display().to_string()),
            Self::Lookup { word, .. } => Some(word.clone()),
            Self::Translation { dictionary, word, .. } => Some(format!("{word} in {}", dictionary.name)),
            _ => None,
        }
    }

    /// The file this node stands for: a book's default format, a format
    /// file, a profile or a dictionary.
    pub fn file(&self) -> Option<PathBuf> {
        match self {
            Self::Book { library, book } => book.default_file(library),
            Self::Format { path, .. } => Some(path.clone()),
            Self::Profile(profile) => Some(profile.path.clone()),
            Self::Dictionary(dictionary) => Some(dictionary.path.clone()),
            _ => None,
        }
    }
}

impl PartialEq for CatalogNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for CatalogNode {}
impl Hash for CatalogNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::NamedRecord;
    use std::collections::HashSet;

    fn library() -> Library {
        Library::new("/lib").unwrap()
    }

    fn book(id: i64, sort: &str) -> BookRecord {
        BookRecord {
            id,
            sort: sort.to_string(),
            author_sort: "Someone".to_string(),
            path: format!("Someone/{sort} ({id})"),
            default_format: Some(FormatRecord::new("EPUB", format!("{sort} - Someone"))),
            format_count: 1,
        }
    }

    #[test]
    fn identity_is_the_key_not_the_data() {
        let before = CatalogNode::Book { library: library(), book: book(1, "Alpha") };
        let after = CatalogNode::Book { library: library(), book: book(1, "Alpha, Revised") };
        assert_eq!(before, after);
        let other = CatalogNode::Book { library: Library::new("/other").unwrap(), book: book(1, "Alpha") };
        assert_ne!(before, other);
        let set: HashSet<_> = [before, after, other].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn scoped_and_aggregate_branches_differ() {
        let all = CatalogNode::Authors { library: None };
        let one = CatalogNode::Authors { library: Some(library()) };
        assert_ne!(all, one);
        assert_ne!(CatalogNode::Authors { library: None }, CatalogNode::Series { library: None });
        assert_eq!(one.library(), Some(&library()));
        assert_eq!(all.library(), None);
    }

    #[test]
    fn authors_are_named_by_sort_key() {
        let node = CatalogNode::Author {
            library: library(),
            author: NamedRecord { id: 2, name: "Terry Pratchett".to_string(), sort: "Pratchett, Terry".to_string() },
        };
        assert_eq!(node.name(), "Pratchett, Terry");
        assert_eq!(node.aliases(), vec!["Terry Pratchett".to_string()]);
        assert_eq!(node.kind(), NodeKind::Author);
    }

    #[test]
    fn book_points_at_its_default_file() {
        let node = CatalogNode::Book { library: library(), book: book(1, "Alpha") };
        assert_eq!(node.name(), "Alpha");
        assert_eq!(node.description().as_deref(), Some("Someone"));
        assert_eq!(node.file(), Some(PathBuf::from("/lib/Someone/Alpha (1)/Alpha - Someone.epub")));
        assert_eq!(node.aliases(), vec!["/lib/Someone/Alpha (1)".to_string()]);
    }

    #[test]
    fn library_is_named_by_directory() {
        let node = CatalogNode::Library(Library::new("/home/reader/Calibre Library").unwrap());
        assert_eq!(node.name(), "Calibre Library");
        assert_eq!(node.description().as_deref(), Some("Library: /home/reader/Calibre Library"));
    }

    #[test]
    fn translations_describe_their_lookup() {
        let dictionary = Dictionary { name: "English - German".to_string(), path: PathBuf::from("/dic/en-de.ifo") };
        let lookup = CatalogNode::Lookup { dictionary: dictionary.clone(), word: "cat".to_string() };
        assert_eq!(lookup.name(), "Lookup into English - German");
        assert_eq!(lookup.kind(), NodeKind::Branch);
        let translation = CatalogNode::Translation { dictionary, word: "cat".to_string(), text: "Katze".to_string() };
        assert_eq!(translation.name(), "Katze");
        assert_eq!(translation.description().as_deref(), Some("cat in English - German"));
        assert_eq!(translation.kind(), NodeKind::Translation);
        assert_ne!(lookup, translation);
    }
}

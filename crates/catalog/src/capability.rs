//! What a node can do.
//!
//! Capabilities are independent traits; [`CatalogNode`] implements each of
//! them by matching on its variant, so a variant that has nothing to offer
//! for a capability simply answers "no".
//!
//! Expansion never caches: every call to [`Expandable::expand`] queries the
//! scanner and the stores again and returns a fresh, single-use stream.

use crate::Catalog;
use crate::monitor::{BasenameFilter, WatchScope};
use crate::node::{CatalogNode, NodeKind};
use crate::sources::PROFILE_EXTENSION;
use async_stream::stream;
use folio_store::selector::compare_named_across;
use folio_store::{BookRecord, Library, MetadataStore, NamedRecord, RecordStream};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tracing::warn;

/// Lazy sequence of child nodes. Listing problems are already degraded: a
/// library whose store is unavailable simply contributes nothing.
pub type NodeStream = Pin<Box<dyn Stream<Item = CatalogNode> + Send + 'static>>;

pub trait Expandable {
    /// Whether browsing into this node is worthwhile.
    fn has_children(&self) -> bool;

    /// List the children, in their fixed order.
    fn expand(&self, catalog: &Catalog) -> NodeStream;
}

pub trait ContentProvider {
    /// Whether the host should keep children sorted by name when filtering.
    fn should_sort_lexically(&self) -> bool;

    /// Kinds of node this one lists.
    fn provides(&self) -> &'static [NodeKind];
}

pub trait Watchable {
    /// Directories whose changes make this node's listing out of date, or
    /// `None` if the node is not watched.
    fn watch_scope(&self, catalog: &Catalog) -> Option<WatchScope>;
}

impl Expandable for CatalogNode {
    fn has_children(&self) -> bool {
        match self {
            Self::Book { book, .. } => book.format_count > 1,
            Self::Format { .. } | Self::Profile(_) | Self::Dictionary(_) | Self::Translation { .. } => false,
            _ => true,
        }
    }

    fn expand(&self, catalog: &Catalog) -> NodeStream {
        let catalog = catalog.clone();
        match self.clone() {
            Self::Root => Box::pin(stream!({
                yield CatalogNode::AllBooks;
                yield CatalogNode::Authors { library: None };
                yield CatalogNode::Series { library: None };
                for library in catalog.libraries() {
                    yield CatalogNode::Library(library);
                }
            })),
            Self::LibraryList => Box::pin(stream!({
                for library in catalog.libraries() {
                    yield CatalogNode::Library(library);
                }
            })),
            Self::AllBooks => Box::pin(stream!({
                for library in catalog.libraries() {
                    for await node in books(&catalog, library, |store| store.list_books()) {
                        yield node;
                    }
                }
            })),
            Self::Library(library) => Box::pin(stream!({
                yield CatalogNode::Authors { library: Some(library.clone()) };
                yield CatalogNode::Series { library: Some(library.clone()) };
                for await node in books(&catalog, library, |store| store.list_books()) {
                    yield node;
                }
            })),
            Self::Authors { library: Some(library) } => Box::pin(stream!({
                let records = catalog.store(&library).list_authors();
                for await author in degrade(&library, records) {
                    yield CatalogNode::Author { library: library.clone(), author };
                }
            })),
            Self::Authors { library: None } => Box::pin(stream!({
                for (library, author) in merged(&catalog, |store| store.list_authors()).await {
                    yield CatalogNode::Author { library, author };
                }
            })),
            Self::Series { library: Some(library) } => Box::pin(stream!({
                let records = catalog.store(&library).list_series();
                for await series in degrade(&library, records) {
                    yield CatalogNode::SeriesEntry { library: library.clone(), series };
                }
            })),
            Self::Series { library: None } => Box::pin(stream!({
                for (library, series) in merged(&catalog, |store| store.list_series()).await {
                    yield CatalogNode::SeriesEntry { library, series };
                }
            })),
            Self::Author { library, author } => Box::pin(books(&catalog, library, move |store| {
                store.list_books_by_author(author.id)
            })),
            Self::SeriesEntry { library, series } => Box::pin(books(&catalog, library, move |store| {
                store.list_books_by_series(series.id)
            })),
            Self::Book { library, book } => {
                let records = catalog.store(&library).list_formats(book.id);
                Box::pin(stream!({
                    let directory = book.directory(&library);
                    for await format in degrade(&library, records) {
                        yield CatalogNode::Format {
                            library: library.clone(),
                            book: book.id,
                            path: directory.join(format.file_name()),
                            format,
                        };
                    }
                }))
            },
            Self::Profiles => {
                let profiles = catalog.profiles().list();
                Box::pin(futures::stream::iter(profiles.into_iter().map(CatalogNode::Profile)))
            },
            Self::Dictionaries => {
                let dictionaries = catalog.dictionaries();
                Box::pin(futures::stream::iter(dictionaries.to_vec().into_iter().map(CatalogNode::Dictionary)))
            },
            Self::Lookup { dictionary, word } => Box::pin(stream!({
                match dictionary.lookup(&word) {
                    Ok(lines) => {
                        for text in lines {
                            yield CatalogNode::Translation { dictionary: dictionary.clone(), word: word.clone(), text };
                        }
                    },
                    Err(err) => warn!(dictionary = %dictionary.name, error = ?err, "lookup failed; listing nothing"),
                }
            })),
            Self::Format { .. } | Self::Profile(_) | Self::Dictionary(_) | Self::Translation { .. } => {
                Box::pin(futures::stream::empty())
            },
        }
    }
}

impl ContentProvider for CatalogNode {
    fn should_sort_lexically(&self) -> bool {
        matches!(
            self,
            Self::AllBooks
                | Self::Authors { .. }
                | Self::Series { .. }
                | Self::Author { .. }
                | Self::SeriesEntry { .. }
                | Self::Profiles
                | Self::Dictionaries
        )
    }

    fn provides(&self) -> &'static [NodeKind] {
        match self {
            Self::Root => &[NodeKind::Branch, NodeKind::Library],
            Self::LibraryList => &[NodeKind::Library],
            Self::Library(_) => &[NodeKind::Branch, NodeKind::Book],
            Self::AllBooks | Self::Author { .. } | Self::SeriesEntry { .. } => &[NodeKind::Book],
            Self::Authors { .. } => &[NodeKind::Author],
            Self::Series { .. } => &[NodeKind::SeriesEntry],
            Self::Book { .. } => &[NodeKind::Format],
            Self::Profiles => &[NodeKind::Profile],
            Self::Dictionaries => &[NodeKind::Dictionary],
            Self::Lookup { .. } => &[NodeKind::Translation],
            Self::Format { .. } | Self::Profile(_) | Self::Dictionary(_) | Self::Translation { .. } => &[],
        }
    }
}

impl Watchable for CatalogNode {
    fn watch_scope(&self, catalog: &Catalog) -> Option<WatchScope> {
        let config_dir = catalog.scanner().paths().config_dir().to_path_buf();
        match self {
            Self::Root
            | Self::LibraryList
            | Self::AllBooks
            | Self::Authors { library: None }
            | Self::Series { library: None } => {
                let mut directories: Vec<_> = catalog.libraries().map(|library| library.path().to_path_buf()).collect();
                directories.push(config_dir);
                Some(WatchScope { directories, filter: BasenameFilter::Calibre })
            },
            Self::Library(library)
            | Self::Authors { library: Some(library) }
            | Self::Series { library: Some(library) }
            | Self::Author { library, .. }
            | Self::SeriesEntry { library, .. }
            | Self::Book { library, .. } => Some(WatchScope {
                directories: vec![library.path().to_path_buf(), config_dir],
                filter: BasenameFilter::Calibre,
            }),
            Self::Profiles => Some(WatchScope {
                directories: catalog.profiles().dir().map(|dir| dir.to_path_buf()).into_iter().collect(),
                filter: BasenameFilter::Extension(PROFILE_EXTENSION),
            }),
            Self::Format { .. }
            | Self::Profile(_)
            | Self::Dictionaries
            | Self::Dictionary(_)
            | Self::Lookup { .. }
            | Self::Translation { .. } => None,
        }
    }
}

/// Authors or series of every discovered library, in one sorted listing.
/// Nothing can be yielded before the last library has been read.
async fn merged<F>(catalog: &Catalog, list: F) -> Vec<(Library, NamedRecord)>
where
    F: Fn(&MetadataStore) -> RecordStream<NamedRecord>,
{
    let libraries: Vec<Library> = catalog.libraries().collect();
    let mut merged = Vec::new();
    for library in libraries {
        let records: Vec<NamedRecord> = degrade(&library, list(&catalog.store(&library))).collect().await;
        merged.extend(records.into_iter().map(|record| (library.clone(), record)));
    }
    merged.sort_by(|(la, a), (lb, b)| compare_named_across((la, a), (lb, b)));
    merged
}

fn books<F>(catalog: &Catalog, library: Library, list: F) -> impl Stream<Item = CatalogNode> + Send + 'static
where
    F: FnOnce(&MetadataStore) -> RecordStream<BookRecord>,
{
    let records = list(&catalog.store(&library));
    stream!({
        for await book in degrade(&library, records) {
            yield CatalogNode::Book { library: library.clone(), book };
        }
    })
}

/// Unwrap a record stream, turning a store failure into the end of the
/// listing.
fn degrade<T: Send + 'static>(library: &Library, records: RecordStream<T>) -> impl Stream<Item = T> + Send + 'static {
    let library = library.clone();
    stream!({
        for await record in records {
            match record {
                Ok(record) => {
                    yield record;
                },
                Err(err) => {
                    warn!(library = %library, error = ?err, "metadata store unavailable; listing nothing");
                    break;
                },
            }
        }
    })
}

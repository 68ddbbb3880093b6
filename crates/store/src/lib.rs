//! Read-only access to Calibre metadata stores.
//!
//! Every Calibre library keeps its catalog in one SQLite file,
//! `metadata.db`, next to the book directories. The application that owns
//! the file may be running and may hold an exclusive lock on it at any time,
//! so this crate:
//! - never writes, and never creates a missing store;
//! - opens one short-lived connection per listing, bounded by a timeout;
//! - treats a missing store as an empty library.
//!
//! # Architecture
//! - [`MetadataBackend`] answers the fixed query shapes for any [`Library`].
//!   [`SqliteBackend`] is the real one; `MockBackend` (feature `mock`) keeps
//!   everything in memory and counts calls.
//! - [`MetadataStore`] binds a backend to one library.
//! - [`selector`] holds the pure ordering and default-format rules every
//!   backend applies.

pub mod backend;
mod db;
pub mod error;
mod models;
pub mod selector;
mod store;

pub use crate::backend::{BookScope, MetadataBackend, RecordStream, SqliteBackend};
pub use crate::models::{AuthorRecord, BookRecord, FormatRecord, Library, NamedRecord, SeriesRecord};
pub use crate::store::MetadataStore;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn MetadataBackend>;

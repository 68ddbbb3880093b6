//! A lazy, hierarchical catalog over Calibre libraries.
//!
//! Nothing is loaded up front. A [`CatalogNode`] lists its children only
//! when asked ([`Expandable::expand`]), and every listing goes back to the
//! configuration files and metadata stores, so what a host sees is as fresh
//! as the last expansion.
//!
//! # Architecture
//! - [`ConfigScanner`] finds libraries in Calibre's configuration.
//! - [`Catalog`] ties the scanner to a [`folio_store::MetadataBackend`] plus
//!   the Unison and StarDict sources.
//! - [`CatalogNode`] is the closed set of node variants; capabilities
//!   ([`Expandable`], [`ContentProvider`], [`Watchable`]) are separate
//!   traits.
//! - [`TrackedNode`] carries a node's lifecycle state. A [`ChangeMonitor`]
//!   flips it to [`NodeState::Stale`] when a watched file changes.
//! - [`LaunchBridge`] builds the external program invocations for a
//!   selection.

mod capability;
mod catalog;
mod discover;
pub mod error;
mod launch;
mod monitor;
mod node;
mod sources;
mod tracked;

pub use crate::capability::{ContentProvider, Expandable, NodeStream, Watchable};
pub use crate::catalog::Catalog;
pub use crate::discover::ConfigScanner;
pub use crate::launch::{EBOOK_EXTENSIONS, Invocation, LaunchBridge};
pub use crate::monitor::{BasenameFilter, ChangeMonitor, WatchScope};
pub use crate::node::{CatalogNode, NodeKey, NodeKind};
pub use crate::sources::{Dictionary, DictionaryIndex, Profile, ProfileSource};
pub use crate::tracked::{NodeState, StateCell, TrackedNode};

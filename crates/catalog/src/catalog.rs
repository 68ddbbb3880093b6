use crate::capability::Watchable;
use crate::discover::ConfigScanner;
use crate::monitor::ChangeMonitor;
use crate::node::CatalogNode;
use crate::sources::{Dictionary, DictionaryIndex, ProfileSource};
use crate::tracked::{StateCell, TrackedNode};
use folio_config::{CalibrePaths, Settings};
use folio_store::{BackendHandle, Library, MetadataStore, SqliteBackend};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Entry point: everything a node needs to list its children.
///
/// Cheap to clone; clones share the backend, the dictionary index and the
/// dictionary directories.
#[derive(Clone)]
pub struct Catalog {
    scanner: ConfigScanner,
    backend: BackendHandle,
    profiles: ProfileSource,
    dictionary_dirs: Arc<RwLock<Vec<PathBuf>>>,
    dictionary_index: Arc<DictionaryIndex>,
    monitoring: bool,
}
impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("scanner", &self.scanner)
            .field("backend", &self.backend.name())
            .field("profiles", &self.profiles)
            .field("monitoring", &self.monitoring)
            .finish_non_exhaustive()
    }
}
impl Catalog {
    /// A catalog over the libraries `scanner` discovers, read through
    /// `backend`. No profiles, no dictionaries, monitoring on.
    pub fn new(scanner: ConfigScanner, backend: BackendHandle) -> Self {
        Self {
            scanner,
            backend,
            profiles: ProfileSource::default(),
            dictionary_dirs: Arc::default(),
            dictionary_index: DictionaryIndex::global(),
            monitoring: true,
        }
    }

    /// Everything from settings: Calibre paths, the SQLite backend, the
    /// Unison directory, StarDict directories.
    pub fn from_settings(settings: &Settings) -> folio_config::error::Result<Self> {
        let paths = CalibrePaths::resolve(&settings.calibre)?;
        let backend: BackendHandle = Arc::new(SqliteBackend::from_settings(&settings.calibre));
        Ok(Self::new(ConfigScanner::new(paths), backend)
            .with_profiles(ProfileSource::new(settings.unison.profile_dir()))
            .with_dictionary_dirs(settings.stardict.dirs.clone())
            .with_monitoring(settings.monitor.enabled))
    }

    pub fn with_profiles(mut self, profiles: ProfileSource) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_dictionary_dirs(self, dirs: Vec<PathBuf>) -> Self {
        *self.dictionary_dirs.write().unwrap_or_else(PoisonError::into_inner) = dirs;
        self
    }

    /// Use `index` instead of the process-wide one.
    pub fn with_dictionary_index(mut self, index: Arc<DictionaryIndex>) -> Self {
        self.dictionary_index = index;
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitoring = enabled;
        self
    }

    pub fn scanner(&self) -> &ConfigScanner {
        &self.scanner
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    pub fn profiles(&self) -> &ProfileSource {
        &self.profiles
    }

    /// Discover libraries afresh.
    pub fn libraries(&self) -> impl Iterator<Item = Library> + use<> {
        self.scanner.discover_libraries()
    }

    pub fn store(&self, library: &Library) -> MetadataStore {
        MetadataStore::new(Arc::clone(&self.backend), library.clone())
    }

    /// Installed dictionaries, scanned once and then served from the index.
    pub fn dictionaries(&self) -> Arc<[Dictionary]> {
        let dirs = self.dictionary_dirs.read().unwrap_or_else(PoisonError::into_inner);
        self.dictionary_index.get_or_scan(&dirs)
    }

    pub fn dictionary_dirs(&self) -> Vec<PathBuf> {
        self.dictionary_dirs.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Change the StarDict directories. The dictionary index is invalidated
    /// when they actually differ.
    pub fn set_dictionary_dirs(&self, dirs: Vec<PathBuf>) {
        let mut current = self.dictionary_dirs.write().unwrap_or_else(PoisonError::into_inner);
        if *current != dirs {
            debug!(?dirs, "dictionary directories changed");
            *current = dirs;
            self.dictionary_index.invalidate();
        }
    }

    /// Start tracking `node`'s lifecycle, installing a change monitor for
    /// its watch scope.
    pub fn track(&self, node: CatalogNode) -> TrackedNode {
        let state = Arc::new(StateCell::default());
        let (monitor, unmonitored) = self.monitor(&node, &state);
        TrackedNode::new(node, self.clone(), state, monitor, unmonitored)
    }

    /// Watch `node`'s scope on behalf of `state`. Also returns whether the
    /// node is left unmonitored although its listing depends on the
    /// filesystem.
    pub(crate) fn monitor(&self, node: &CatalogNode, state: &Arc<StateCell>) -> (Option<ChangeMonitor>, bool) {
        let Some(scope) = node.watch_scope(self) else {
            return (None, false);
        };
        if !self.monitoring {
            return (None, true);
        }
        let weak = Arc::downgrade(state);
        let on_change = move || {
            if let Some(state) = weak.upgrade() {
                state.mark_stale();
            }
        };
        match ChangeMonitor::watch(scope.directories, scope.filter, on_change) {
            Ok(Some(monitor)) => (Some(monitor), false),
            Ok(None) => {
                debug!(node = %node.name(), "no existing directories to monitor");
                (None, true)
            },
            Err(err) => {
                warn!(node = %node.name(), error = ?err, "could not monitor changes; refreshing on every access");
                (None, true)
            },
        }
    }
}

//! Filesystem change monitoring.
//!
//! A [`ChangeMonitor`] watches a few directories (non-recursively) and calls
//! back when a file with an interesting basename is created, modified or
//! removed. Callbacks run on the watcher's own thread; the catalog only ever
//! uses them to flag a node as stale.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use folio_config::calibre::WATCHED_BASENAMES;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Which file names inside a watched directory matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasenameFilter {
    /// Calibre's metadata store and legacy config artifacts.
    Calibre,
    /// Any file with this extension.
    Extension(&'static str),
}
impl BasenameFilter {
    pub fn matches(&self, basename: &OsStr) -> bool {
        match self {
            Self::Calibre => WATCHED_BASENAMES.iter().any(|name| basename == *name),
            Self::Extension(extension) => {
                std::path::Path::new(basename).extension().is_some_and(|ext| ext == *extension)
            },
        }
    }
}

/// The directories a node depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchScope {
    pub directories: Vec<PathBuf>,
    pub filter: BasenameFilter,
}

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Turns raw watcher events into change callbacks.
#[derive(Clone)]
struct Invalidator {
    filter: BasenameFilter,
    on_change: Callback,
}
impl Invalidator {
    fn is_relevant(&self, event: &notify::Event) -> bool {
        let kind = matches!(event.kind, EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_));
        kind && event.paths.iter().any(|path| path.file_name().is_some_and(|name| self.filter.matches(name)))
    }
}
impl notify::EventHandler for Invalidator {
    fn handle_event(&mut self, event: notify::Result<notify::Event>) {
        match event {
            Ok(event) if self.is_relevant(&event) => {
                trace!(paths = ?event.paths, "relevant change");
                (self.on_change)();
            },
            Ok(_) => {},
            Err(err) => warn!(error = %err, "filesystem watcher error"),
        }
    }
}

/// The directories a monitor would watch: those that exist, each once, in
/// the given order.
pub(crate) fn existing_directories(directories: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut existing: Vec<PathBuf> = Vec::new();
    for dir in directories {
        if dir.is_dir() && !existing.contains(&dir) {
            existing.push(dir);
        }
    }
    existing
}

/// Live watch on a set of directories. Dropping it stops watching.
pub struct ChangeMonitor {
    directories: Vec<PathBuf>,
    #[cfg(test)]
    handler: Invalidator,
    _watcher: RecommendedWatcher,
}
impl std::fmt::Debug for ChangeMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeMonitor").field("directories", &self.directories).finish_non_exhaustive()
    }
}
impl ChangeMonitor {
    /// Watch the given directories, calling `on_change` for every relevant
    /// event.
    ///
    /// Directories that do not exist are skipped. Returns `Ok(None)` when
    /// none are left: there is nothing to watch.
    pub fn watch(
        directories: impl IntoIterator<Item = PathBuf>,
        filter: BasenameFilter,
        on_change: impl Fn() + Send + Sync + 'static,
    ) -> Result<Option<Self>> {
        let existing = existing_directories(directories);
        let Some(first) = existing.first() else {
            debug!("nothing to watch");
            return Ok(None);
        };
        let handler = Invalidator { filter, on_change: Arc::new(on_change) };
        let mut watcher = notify::recommended_watcher(handler.clone()).or_raise(|| ErrorKind::Monitor(first.clone()))?;
        for dir in &existing {
            watcher.watch(dir, RecursiveMode::NonRecursive).or_raise(|| ErrorKind::Monitor(dir.clone()))?;
        }
        debug!(directories = ?existing, ?filter, "watching for changes");
        Ok(Some(Self {
            directories: existing,
            #[cfg(test)]
            handler,
            _watcher: watcher,
        }))
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Feed an event through the filter as if the watcher had reported it.
    #[cfg(test)]
    pub(crate) fn dispatch(&self, event: notify::Event) {
        notify::EventHandler::handle_event(&mut self.handler.clone(), Ok(event));
    }
}

//! Library discovery from Calibre's legacy configuration artifacts.
//!
//! Calibre has recorded "libraries the user has opened" in three places over
//! its history. All of them are read, in this order, and merged:
//!
//! 1. `gui.json`: keys of `library_usage_stats`;
//! 2. `history.plist`: the "choose library" dialog history;
//! 3. `global.py`: the `library_path = '...'` default library.
//!
//! An artifact that is missing, unreadable or malformed contributes nothing.
//! Discovery never fails.

mod global;
mod history;
mod usage_stats;

use crate::error::Result;
use folio_config::CalibrePaths;
use folio_store::Library;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

type Reader = fn(&Path) -> Result<Vec<PathBuf>>;

#[derive(Debug, Clone)]
pub struct ConfigScanner {
    paths: CalibrePaths,
}
impl ConfigScanner {
    pub fn new(paths: CalibrePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &CalibrePaths {
        &self.paths
    }

    /// Calibre's config directory, if it exists right now.
    pub fn config_dir(&self) -> Option<&Path> {
        Some(self.paths.config_dir()).filter(|dir| dir.is_dir())
    }

    /// Libraries recorded in the legacy artifacts, lazily.
    ///
    /// Each artifact is only read once the previous one's candidates have
    /// been consumed. Candidates that are not existing directories, or not
    /// absolute, are dropped. Every library appears once, at the position it
    /// was first seen.
    pub fn discover_libraries(&self) -> impl Iterator<Item = Library> + use<> {
        let sources: [(&'static str, PathBuf, Reader); 3] = [
            ("gui.json", self.paths.gui_json(), usage_stats::read),
            ("history.plist", self.paths.history(), history::read),
            ("global.py", self.paths.global(), global::read),
        ];
        let mut seen = HashSet::new();
        sources
            .into_iter()
            .flat_map(|(source, path, read)| contribution(source, &path, read))
            .filter(|candidate| candidate.is_dir())
            .filter_map(|candidate| match Library::new(&candidate) {
                Ok(library) => Some(library),
                Err(_) => {
                    debug!(candidate = %candidate.display(), "ignoring relative library path");
                    None
                },
            })
            .filter(move |library| seen.insert(library.clone()))
    }
}

fn contribution(source: &'static str, path: &Path, read: Reader) -> Vec<PathBuf> {
    match read(path) {
        Ok(candidates) => {
            debug!(source, candidates = candidates.len(), "read library candidates");
            candidates
        },
        Err(err) => {
            debug!(source, error = ?err, "config artifact contributes no libraries");
            Vec::new()
        },
    }
}

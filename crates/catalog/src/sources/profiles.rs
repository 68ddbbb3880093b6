//! Unison profiles: `*.prf` files in the Unison directory.

use std::path::{Path, PathBuf};
use tracing::debug;

pub(crate) const PROFILE_EXTENSION: &str = "prf";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Profile {
    /// File stem; what `unison` takes as its profile argument.
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileSource {
    dir: Option<PathBuf>,
}
impl ProfileSource {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Profiles sorted by name. A missing directory has no profiles.
    pub fn list(&self) -> Vec<Profile> {
        let Some(dir) = &self.dir else {
            return Vec::new();
        };
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "no unison profiles");
                return Vec::new();
            },
        };
        let mut profiles: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == PROFILE_EXTENSION))
            .filter_map(|path| {
                let name = path.file_stem()?.to_string_lossy().into_owned();
                Some(Profile { name, path })
            })
            .collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        profiles
    }
}

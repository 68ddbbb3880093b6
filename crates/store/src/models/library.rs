use crate::error::{ErrorKind, Result};
use folio_config::calibre::METADATA_FILE;
use std::fmt;
use std::path::{Path, PathBuf};

/// A Calibre library: a directory holding one `metadata.db` and the book
/// files it describes.
///
/// Libraries are plain values identified by their path. Two libraries with
/// equal paths are the same library, however many config files mention it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Library {
    path: PathBuf,
}
impl Library {
    /// Returns [`ErrorKind::InvalidLibrary`] for relative paths.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_absolute() {
            exn::bail!(ErrorKind::InvalidLibrary(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last path component, used as the display name.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn metadata_file(&self) -> PathBuf {
        self.path.join(METADATA_FILE)
    }

    /// Whether the library directory exists right now.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }
}
impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
impl AsRef<Path> for Library {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

//! StarDict dictionaries.
//!
//! Each dictionary is described by an `.ifo` file whose `bookname=` line
//! holds its display name. Scanning dictionary directories is slow enough
//! that the result is kept for the life of the process, until
//! [`DictionaryIndex::invalidate`] is called or other directories are asked
//! for.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::{debug, instrument};

const IFO_EXTENSION: &str = "ifo";
const BOOKNAME: &str = "bookname";

static GLOBAL: LazyLock<Arc<DictionaryIndex>> = LazyLock::new(|| Arc::new(DictionaryIndex::new()));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dictionary {
    pub name: String,
    /// The `.ifo` file.
    pub path: PathBuf,
}

/// Dictionaries found by one scan, and the directories that scan covered.
#[derive(Debug)]
struct Scanned {
    dirs: Vec<PathBuf>,
    dictionaries: Arc<[Dictionary]>,
}

/// Memoized set of installed dictionaries.
#[derive(Debug, Default)]
pub struct DictionaryIndex {
    cached: RwLock<Option<Scanned>>,
    scans: AtomicUsize,
}
impl DictionaryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide index.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Cached dictionaries, scanning `dirs` first if nothing is cached or
    /// the cached set was scanned from other directories.
    pub fn get_or_scan(&self, dirs: &[PathBuf]) -> Arc<[Dictionary]> {
        let hit = |cached: &Option<Scanned>| {
            cached.as_ref().filter(|scanned| scanned.dirs == dirs).map(|scanned| Arc::clone(&scanned.dictionaries))
        };
        if let Some(dictionaries) = hit(&*self.cached.read().unwrap_or_else(PoisonError::into_inner)) {
            return dictionaries;
        }
        let mut guard = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(dictionaries) = hit(&*guard) {
            return dictionaries;
        }
        if guard.is_some() {
            debug!(?dirs, "dictionary directories changed; rescanning");
        }
        let dictionaries: Arc<[Dictionary]> = scan(dirs).into();
        self.scans.fetch_add(1, Ordering::Relaxed);
        *guard = Some(Scanned { dirs: dirs.to_vec(), dictionaries: Arc::clone(&dictionaries) });
        dictionaries
    }

    /// Forget the cached set; the next lookup scans again.
    pub fn invalidate(&self) {
        debug!("invalidating dictionary index");
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// How many times the directories have been scanned.
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }
}

#[instrument(level = "debug")]
fn scan(dirs: &[PathBuf]) -> Vec<Dictionary> {
    let mut dictionaries: Vec<_> = dirs.iter().flat_map(|dir| scan_dir(dir)).collect();
    dictionaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    dictionaries
}

fn scan_dir(dir: &Path) -> Vec<Dictionary> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), error = %err, "skipping dictionary directory");
            return Vec::new();
        },
    };
    entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == IFO_EXTENSION))
        .filter_map(|path| {
            let name = read_bookname(&path)?;
            Some(Dictionary { name, path })
        })
        .collect()
}

fn read_bookname(path: &Path) -> Option<String> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            debug!(file = %path.display(), error = %err, "unreadable dictionary info");
            return None;
        },
    };
    text.lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == BOOKNAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ifo(dir: &Path, file: &str, bookname: Option<&str>) {
        let mut text = String::from("StarDict's dict ifo file\nversion=2.4.2\nwordcount=1000\n");
        if let Some(name) = bookname {
            text.push_str(&format!("bookname={name}\n"));
        }
        std::fs::write(dir.join(file), text).unwrap();
    }

    #[test]
    fn scans_ifo_files_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        ifo(dir.path(), "en-de.ifo", Some("English - German"));
        ifo(dir.path(), "de-en.ifo", Some(" Deutsch - Englisch "));
        ifo(dir.path(), "broken.ifo", None);
        ifo(dir.path(), "en-de.idx", Some("Not an info file"));
        let found = scan(&[dir.path().to_path_buf(), dir.path().join("missing")]);
        let names: Vec<_> = found.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Deutsch - Englisch", "English - German"]);
        assert_eq!(found[1].path, dir.path().join("en-de.ifo"));
    }

    #[test]
    fn index_scans_once_until_invalidated() {
        let dir = TempDir::new().unwrap();
        let dirs = vec![dir.path().to_path_buf()];
        ifo(dir.path(), "a.ifo", Some("Alpha"));
        let index = DictionaryIndex::new();
        assert_eq!(index.get_or_scan(&dirs).len(), 1);
        ifo(dir.path(), "b.ifo", Some("Beta"));
        assert_eq!(index.get_or_scan(&dirs).len(), 1);
        assert_eq!(index.scans(), 1);
        index.invalidate();
        assert_eq!(index.get_or_scan(&dirs).len(), 2);
        assert_eq!(index.scans(), 2);
    }

    #[test]
    fn empty_result_is_cached_too() {
        let dir = TempDir::new().unwrap();
        let index = DictionaryIndex::new();
        assert!(index.get_or_scan(&[dir.path().to_path_buf()]).is_empty());
        assert!(index.get_or_scan(&[dir.path().to_path_buf()]).is_empty());
        assert_eq!(index.scans(), 1);
    }

    #[test]
    fn other_directories_are_scanned_afresh() {
        let (first, second) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        ifo(first.path(), "a.ifo", Some("Alpha"));
        ifo(second.path(), "b.ifo", Some("Beta"));
        let index = DictionaryIndex::new();
        let names = |found: Arc<[Dictionary]>| found.iter().map(|d| d.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(index.get_or_scan(&[first.path().to_path_buf()])), vec!["Alpha"]);
        assert_eq!(names(index.get_or_scan(&[second.path().to_path_buf()])), vec!["Beta"]);
        assert_eq!(names(index.get_or_scan(&[second.path().to_path_buf()])), vec!["Beta"]);
        assert_eq!(index.scans(), 2);
    }
}

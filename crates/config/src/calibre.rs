//! Locations of Calibre's own configuration artifacts.
//!
//! Calibre records the libraries a user has opened in several places that
//! accumulated over its history. This module only knows *where* they live;
//! parsing them is the catalog's job.

use crate::error::{ErrorKind, Result};
use crate::settings::CalibreSettings;
use directories::BaseDirs;
use exn::OptionExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable Calibre itself honours to relocate its config.
pub const CONFIG_DIR_ENV: &str = "CALIBRE_CONFIG_DIRECTORY";
/// JSON document holding `library_usage_stats`.
pub const GUI_JSON_FILE: &str = "gui.json";
/// Property list holding the "choose library" dialog history.
pub const HISTORY_FILE: &str = "history.plist";
/// Python-syntax global preferences holding `library_path = ...`.
pub const GLOBAL_FILE: &str = "global.py";
/// Per-library metadata store.
pub const METADATA_FILE: &str = "metadata.db";

/// Basenames whose modification should trigger re-discovery.
pub const WATCHED_BASENAMES: [&str; 4] = [METADATA_FILE, HISTORY_FILE, GLOBAL_FILE, GUI_JSON_FILE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrePaths {
    config_dir: PathBuf,
}
impl CalibrePaths {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self { config_dir: config_dir.into() }
    }

    /// Resolve Calibre's configuration directory: explicit setting, then
    /// [`CONFIG_DIR_ENV`], then `<user config dir>/calibre`.
    pub fn resolve(settings: &CalibreSettings) -> Result<Self> {
        Self::resolve_with(settings, std::env::var_os(CONFIG_DIR_ENV))
    }

    fn resolve_with(settings: &CalibreSettings, env: Option<OsString>) -> Result<Self> {
        if let Some(dir) = &settings.config_dir {
            return Ok(Self::new(dir));
        }
        if let Some(dir) = env.filter(|d| !d.is_empty()) {
            return Ok(Self::new(dir));
        }
        let dirs = BaseDirs::new().ok_or_raise(|| ErrorKind::NoDirectory("calibre config"))?;
        Ok(Self::new(dirs.config_dir().join("calibre")))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn gui_json(&self) -> PathBuf {
        self.config_dir.join(GUI_JSON_FILE)
    }

    pub fn history(&self) -> PathBuf {
        self.config_dir.join(HISTORY_FILE)
    }

    pub fn global(&self) -> PathBuf {
        self.config_dir.join(GLOBAL_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("/explicit"), Some("/from-env"), "/explicit")]
    #[case(None, Some("/from-env"), "/from-env")]
    fn resolution_precedence(#[case] explicit: Option<&str>, #[case] env: Option<&str>, #[case] expected: &str) {
        let settings = CalibreSettings { config_dir: explicit.map(PathBuf::from), ..Default::default() };
        let paths = CalibrePaths::resolve_with(&settings, env.map(OsString::from)).unwrap();
        assert_eq!(paths.config_dir(), Path::new(expected));
    }

    #[test]
    fn empty_env_falls_through_to_platform_dir() {
        let settings = CalibreSettings::default();
        if let Ok(paths) = CalibrePaths::resolve_with(&settings, Some(OsString::new())) {
            assert!(paths.config_dir().ends_with("calibre"));
        }
    }

    #[test]
    fn artifact_paths() {
        let paths = CalibrePaths::new("/home/reader/.config/calibre");
        assert_eq!(paths.gui_json(), Path::new("/home/reader/.config/calibre/gui.json"));
        assert_eq!(paths.history(), Path::new("/home/reader/.config/calibre/history.plist"));
        assert_eq!(paths.global(), Path::new("/home/reader/.config/calibre/global.py"));
    }
}

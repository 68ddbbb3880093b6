//! Layered application settings.
//!
//! Settings are assembled from three layers, later layers overriding earlier
//! ones:
//!
//! 1. Built-in defaults ([`Settings::default`]).
//! 2. A TOML file, either given explicitly or `folio.toml` inside the
//!    platform config directory (e.g. `~/.config/folio/folio.toml`). A missing
//!    default file is not an error.
//! 3. Environment variables prefixed with `FOLIO_`, using `__` to address
//!    nested keys (`FOLIO_CALIBRE__CONNECT_TIMEOUT_MS=250`).
//!
//! # Example
//!
//! ```toml
//! [calibre]
//! program = "calibre"
//! connect_timeout_ms = 1000
//!
//! [stardict]
//! dirs = ["/usr/share/stardict/dic/", "~/.stardict/dic"]
//!
//! [monitor]
//! enabled = true
//! ```

use crate::error::{ErrorKind, Result};
use directories::{BaseDirs, ProjectDirs};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

const ENV_PREFIX: &str = "FOLIO_";
const SETTINGS_FILE: &str = "folio.toml";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1000;
const DEFAULT_STARDICT_DIR: &str = "/usr/share/stardict/dic/";

/// Top-level settings for every catalog source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub calibre: CalibreSettings,
    pub unison: UnisonSettings,
    pub stardict: StardictSettings,
    pub monitor: MonitorSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibreSettings {
    /// Overrides Calibre's own configuration directory. When unset, the
    /// `CALIBRE_CONFIG_DIRECTORY` environment variable is consulted before
    /// falling back to `<config dir>/calibre`.
    pub config_dir: Option<PathBuf>,
    /// Executable used for "open library" and "add to library".
    pub program: String,
    /// Upper bound for opening a library's metadata store. Calibre holds an
    /// exclusive lock on `metadata.db` while writing; listing must give up
    /// rather than hang.
    pub connect_timeout_ms: u64,
}
impl Default for CalibreSettings {
    fn default() -> Self {
        Self {
            config_dir: None,
            program: "calibre".to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}
impl CalibreSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnisonSettings {
    /// Profile directory; defaults to `~/.unison`.
    pub dir: Option<PathBuf>,
    pub program: String,
}
impl Default for UnisonSettings {
    fn default() -> Self {
        Self { dir: None, program: "unison".to_string() }
    }
}
impl UnisonSettings {
    /// The configured profile directory, or `~/.unison`.
    pub fn profile_dir(&self) -> Option<PathBuf> {
        self.dir.clone().or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().join(".unison")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StardictSettings {
    /// Directories searched (non-recursively) for `.ifo` dictionary files.
    pub dirs: Vec<PathBuf>,
}
impl Default for StardictSettings {
    fn default() -> Self {
        Self { dirs: vec![PathBuf::from(DEFAULT_STARDICT_DIR)] }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Install filesystem watchers for tracked catalog nodes. When disabled,
    /// tracked nodes ask to be refreshed on every access cycle instead.
    pub enabled: bool,
}
impl Default for MonitorSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Settings {
    /// Load settings from the default file location (if present) and the
    /// environment.
    #[instrument("loading settings")]
    pub fn load() -> Result<Self> {
        Self::extract(Self::figment(Self::default_file()))
    }

    /// Load settings from an explicit file. Unlike [`load`](Self::load), a
    /// missing file is an error: the caller asked for it by name.
    #[instrument("loading settings", fields(path = %path.as_ref().display()))]
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            exn::bail!(ErrorKind::FileNotFound(path.to_path_buf()));
        }
        Self::extract(Self::figment(Some(path.to_path_buf())))
    }

    /// Where [`load`](Self::load) looks for the settings file.
    pub fn default_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "folio").map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    fn figment(file: Option<PathBuf>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(file) = file {
            tracing::debug!(file = %file.display(), "Merging settings file");
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn extract(figment: Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_calibre_behaviour() {
        let settings = Settings::default();
        assert_eq!(settings.calibre.program, "calibre");
        assert_eq!(settings.calibre.connect_timeout(), Duration::from_secs(1));
        assert_eq!(settings.stardict.dirs, vec![PathBuf::from("/usr/share/stardict/dic/")]);
        assert!(settings.monitor.enabled);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("folio.toml");
        fs::write(
            &file,
            r#"
                [calibre]
                connect_timeout_ms = 250
                config_dir = "/srv/calibre-config"

                [monitor]
                enabled = false
            "#,
        )
        .unwrap();
        let settings = Settings::extract(Settings::figment(Some(file))).unwrap();
        assert_eq!(settings.calibre.connect_timeout(), Duration::from_millis(250));
        assert_eq!(settings.calibre.config_dir, Some(PathBuf::from("/srv/calibre-config")));
        // Untouched keys keep their defaults.
        assert_eq!(settings.calibre.program, "calibre");
        assert!(!settings.monitor.enabled);
    }

    #[test]
    fn malformed_file_is_invalid() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("folio.toml");
        fs::write(&file, "[calibre]\nconnect_timeout_ms = \"soon\"\n").unwrap();
        let err = Settings::load_from(&file).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = Settings::load_from(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::FileNotFound(_)));
    }

    #[test]
    fn explicit_unison_dir_wins() {
        let unison = UnisonSettings { dir: Some(PathBuf::from("/tmp/profiles")), ..Default::default() };
        assert_eq!(unison.profile_dir(), Some(PathBuf::from("/tmp/profiles")));
    }
}

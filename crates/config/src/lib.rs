//! Configuration for folio.
//!
//! Two unrelated kinds of configuration live here:
//! - [`Settings`]: folio's own layered settings (defaults, TOML file,
//!   `FOLIO_*` environment variables).
//! - [`CalibrePaths`]: where Calibre keeps the legacy artifacts that list
//!   its libraries. Folio only ever reads these.

pub mod calibre;
pub mod error;
mod settings;

pub use crate::calibre::CalibrePaths;
pub use crate::settings::{CalibreSettings, MonitorSettings, Settings, StardictSettings, UnisonSettings};

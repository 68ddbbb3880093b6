//! `gui.json`: the `library_usage_stats` mapping.
//!
//! ```json
//! { "library_usage_stats": { "/home/reader/Calibre Library": 42, "/srv/books": 3 } }
//! ```
//!
//! Keys are library paths; the values (usage counters) are ignored. Keys are
//! returned in document order.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct GuiJson {
    #[serde(default)]
    library_usage_stats: Option<serde_json::Map<String, serde_json::Value>>,
}

pub(crate) fn read(path: &Path) -> Result<Vec<PathBuf>> {
    let unavailable = || ErrorKind::ConfigUnavailable(path.to_path_buf());
    let data = std::fs::read(path).or_raise(unavailable)?;
    parse(&data).or_raise(unavailable)
}

fn parse(data: &[u8]) -> serde_json::Result<Vec<PathBuf>> {
    let gui: GuiJson = serde_json::from_slice(data)?;
    Ok(gui.library_usage_stats.unwrap_or_default().into_iter().map(|(key, _)| PathBuf::from(key)).collect())
}

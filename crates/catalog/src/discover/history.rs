//! `history.plist`: paths previously picked in the "choose library" dialog.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};

/// Dictionary key the dialog history is stored under.
pub(crate) const HISTORY_KEY: &str = "lineedit_history_choose_library_dialog";

/// Both XML and binary property lists are accepted. Non-string array entries
/// are ignored.
pub(crate) fn read(path: &Path) -> Result<Vec<PathBuf>> {
    let unavailable = || ErrorKind::ConfigUnavailable(path.to_path_buf());
    let value = plist::Value::from_file(path).or_raise(unavailable)?;
    let Some(entries) = value.as_dictionary().ok_or_raise(unavailable)?.get(HISTORY_KEY) else {
        return Ok(Vec::new());
    };
    let entries = entries.as_array().ok_or_raise(unavailable)?;
    Ok(entries.iter().filter_map(plist::Value::as_string).map(PathBuf::from).collect())
}

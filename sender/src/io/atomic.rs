//! Temp-file + rename writes for small state files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Atomically replace `path` with `contents`, creating parent directories.
///
/// `what` names the file in error messages (e.g. "run state").
pub fn write_atomic(path: &Path, contents: &str, what: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("{what} path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);
    fs::write(tmp_path, contents)
        .with_context(|| format!("write temp {what} {}", tmp_path.display()))?;
    fs::rename(tmp_path, path).with_context(|| format!("replace {what} {}", path.display()))?;
    Ok(())
}

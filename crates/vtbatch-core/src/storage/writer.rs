//! Unique temp file, fsync and rename.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;

use super::TEMP_SUFFIX;

/// Write `data` to `final_path` through a fresh temp file in the same
/// directory: write everything, sync, then rename over the final path.
/// Each call gets its own temp file, so concurrent writers of one path
/// cannot truncate each other; the last rename wins. On failure the temp
/// file is removed and the final path is untouched.
pub fn write_atomic(final_path: &Path, data: &[u8]) -> Result<()> {
    let dir = match final_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut prefix = OsString::from(".");
    if let Some(name) = final_path.file_name() {
        prefix.push(name);
    }
    prefix.push(".");

    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    let tmp_path = tmp.path().to_path_buf();
    tmp.write_all(data)
        .with_context(|| format!("storage write failed: {}", tmp_path.display()))?;
    tmp.as_file().sync_all().context("storage sync failed")?;
    tmp.persist(final_path).map_err(|e| e.error).with_context(|| {
        format!("failed to rename {} to {}", tmp_path.display(), final_path.display())
    })?;
    Ok(())
}

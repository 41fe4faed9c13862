//! CLI command handlers, one file per subcommand.

mod checksum;
mod download;
mod report;
mod search;

pub use checksum::run_checksum;
pub use download::run_download;
pub use report::run_report;
pub use search::run_search;

use anyhow::{Context, Result};
use std::path::Path;

/// Identifiers from the command line followed by those in `file` (one per
/// line, surrounding whitespace trimmed, blank lines skipped).
pub(crate) fn collect_ids(args: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut ids = args.to_vec();
    if let Some(path) = file {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read identifiers from {}", path.display()))?;
        ids.extend(
            data.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }
    Ok(ids)
}

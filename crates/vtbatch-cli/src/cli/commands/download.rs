//! `vtbatch download`: fetch, verify and store samples.

use anyhow::Result;
use std::io::Write;
use std::path::Path;
use vtbatch_core::config::VtConfig;
use vtbatch_core::VtClient;

use super::collect_ids;

/// Prints `<id>\t<outcome>` per identifier; fails if any download failed.
pub fn run_download(
    mut cfg: VtConfig,
    ids: &[String],
    file: Option<&Path>,
    dir: Option<&Path>,
) -> Result<()> {
    if let Some(dir) = dir {
        cfg.download_dir = dir.to_path_buf();
    }
    let ids = collect_ids(ids, file)?;
    let client = VtClient::new(cfg)?;

    let mut out = std::io::stdout().lock();
    let (mut ok, mut failed) = (0usize, 0usize);
    for reports in client.download(ids)? {
        for r in reports {
            if r.outcome.is_success() {
                ok += 1;
            } else {
                failed += 1;
            }
            writeln!(out, "{}\t{}", r.identifier, r.outcome)?;
        }
        out.flush()?;
    }
    tracing::info!(ok, failed, "downloads finished");
    if failed > 0 {
        anyhow::bail!("{} of {} downloads failed", failed, ok + failed);
    }
    Ok(())
}

//! `vtbatch report`: batch lookups, one JSON line per identifier.

use anyhow::Result;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use vtbatch_core::config::VtConfig;
use vtbatch_core::VtClient;

use super::collect_ids;

pub fn run_report(cfg: VtConfig, ids: &[String], file: Option<&Path>, allinfo: bool) -> Result<()> {
    let ids = collect_ids(ids, file)?;
    let client = VtClient::new(cfg)?;
    let mut out = std::io::stdout().lock();
    for (round, map) in client.reports(ids, allinfo).enumerate() {
        tracing::info!(round, entries = map.len(), errors = map.error_count(), "report round");
        let mut entries: Vec<_> = map.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (id, result) in entries {
            writeln!(out, "{}", json!({ "id": id, "result": result.to_json() }))?;
        }
        out.flush()?;
    }
    Ok(())
}

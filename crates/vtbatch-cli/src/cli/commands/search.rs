//! `vtbatch search`: print matching hashes, one per line.

use anyhow::Result;
use vtbatch_core::config::VtConfig;
use vtbatch_core::VtClient;

pub fn run_search(cfg: VtConfig, query: &str, max: Option<usize>, intelligence: bool) -> Result<()> {
    let client = VtClient::new(cfg)?;
    let hashes = if intelligence {
        client.search_intelligence(query, max)?
    } else {
        client.search(query, max)?
    };
    for h in hashes {
        println!("{h}");
    }
    Ok(())
}

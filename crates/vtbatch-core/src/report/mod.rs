//! Batch report lookups.
//!
//! Identifiers are grouped into comma-joined requests of at most `chunk`
//! items, groups are run `workers` at a time through the worker pool, and
//! each round's responses are demultiplexed into a [`ResultMap`] that is
//! yielded before the next round starts.

mod demux;
mod result;

pub use demux::SELF_ID_FIELD;
pub use result::{LookupResult, ResultMap, ERROR_MARKER};

use std::sync::Arc;

use serde_json::Value;

use crate::identifier::{self, RequestGroup};
use crate::scheduler::{Rounds, WorkerPool};
use crate::transport::{Request, Transport};

/// Issues lookup requests against the report endpoint.
#[derive(Clone)]
pub struct ReportFetcher {
    transport: Arc<dyn Transport>,
    pool: WorkerPool,
    url: String,
    api_key: String,
    chunk: usize,
}

impl ReportFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        pool: WorkerPool,
        url: impl Into<String>,
        api_key: impl Into<String>,
        chunk: usize,
    ) -> Self {
        Self {
            transport,
            pool,
            url: url.into(),
            api_key: api_key.into(),
            chunk: chunk.max(1),
        }
    }

    /// The lookup request for one group.
    pub fn request_for(&self, group: &RequestGroup, allinfo: bool) -> Request {
        Request::get(&self.url)
            .param("apikey", &self.api_key)
            .param("resource", group.composite_key())
            .param("allinfo", if allinfo { "1" } else { "0" })
    }

    /// Look up one identifier directly, without the pool.
    pub fn report(&self, identifier: &str, allinfo: bool) -> LookupResult {
        let groups = identifier::group([identifier], 1);
        let Some(group) = groups.first() else {
            return LookupResult::Error;
        };
        let req = self.request_for(group, allinfo);
        match self.transport.call(&req) {
            Ok(resp) if resp.is_success() => resp
                .json::<Value>()
                .map(LookupResult::Record)
                .unwrap_or(LookupResult::Error),
            Ok(resp) => {
                tracing::warn!(resource = identifier, status = resp.status, "lookup failed");
                LookupResult::Error
            }
            Err(e) => {
                tracing::warn!(resource = identifier, "lookup failed: {}", e);
                LookupResult::Error
            }
        }
    }

    /// Lazily look up all identifiers, one [`ResultMap`] per round of up to
    /// `workers` groups. Empty identifiers are skipped.
    pub fn reports<I, S>(
        &self,
        identifiers: I,
        allinfo: bool,
    ) -> Rounds<RequestGroup, impl FnMut(usize, Vec<RequestGroup>) -> ResultMap + Send>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let groups = identifier::group(identifiers, self.chunk);
        tracing::debug!(
            groups = groups.len(),
            chunk = self.chunk,
            workers = self.pool.workers(),
            "planned lookup rounds"
        );
        let fetcher = self.clone();
        Rounds::new(groups, self.pool.workers(), move |round, groups: Vec<RequestGroup>| {
            fetcher.run_round(round, &groups, allinfo)
        })
    }

    fn run_round(&self, round: usize, groups: &[RequestGroup], allinfo: bool) -> ResultMap {
        let transport = &self.transport;
        let ops: Vec<_> = groups
            .iter()
            .map(|group| {
                let req = self.request_for(group, allinfo);
                move || transport.call(&req)
            })
            .collect();
        let outcomes = self.pool.run(ops);

        let mut map = ResultMap::new();
        for (group, outcome) in groups.iter().zip(outcomes) {
            demux::absorb(&mut map, group, outcome);
        }
        tracing::info!(
            round,
            groups = groups.len(),
            entries = map.len(),
            errors = map.error_count(),
            dropped = map.dropped_records(),
            "lookup round complete"
        );
        map
    }
}

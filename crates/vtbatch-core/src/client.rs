//! One value owning the transport, worker pool and configuration, exposing
//! the batch lookup, search and download operations.

use std::sync::Arc;

use anyhow::Result;

use crate::config::{VtConfig, API_KEY_ENV};
use crate::downloader::{DownloadReport, Downloader};
use crate::identifier::RequestGroup;
use crate::report::{LookupResult, ReportFetcher, ResultMap};
use crate::scheduler::{Rounds, WorkerPool};
use crate::search::{SearchError, SearchVariant, Searcher};
use crate::storage::ArtifactStore;
use crate::transport::{CurlTransport, Transport};

#[derive(Clone)]
pub struct VtClient {
    transport: Arc<dyn Transport>,
    pool: WorkerPool,
    config: VtConfig,
    api_key: String,
}

impl VtClient {
    /// Client over the libcurl transport. Fails if no API key is configured.
    pub fn new(config: VtConfig) -> Result<Self> {
        let Some(api_key) = config.resolve_api_key() else {
            anyhow::bail!("no API key: set {} or api_key in the config file", API_KEY_ENV);
        };
        let transport = Arc::new(CurlTransport::from_config(&config));
        Ok(Self::with_transport(config, api_key, transport))
    }

    /// Client over any transport (tests, alternative HTTP stacks).
    pub fn with_transport(
        config: VtConfig,
        api_key: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            pool: WorkerPool::new(config.workers()),
            transport,
            config,
            api_key: api_key.into(),
        }
    }

    pub fn config(&self) -> &VtConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    pub fn report_fetcher(&self) -> ReportFetcher {
        ReportFetcher::new(
            Arc::clone(&self.transport),
            self.pool,
            &self.config.endpoints.report,
            &self.api_key,
            self.config.chunk_size(),
        )
    }

    pub fn searcher(&self, variant: SearchVariant) -> Searcher {
        let url = match variant {
            SearchVariant::Offset => &self.config.endpoints.search,
            SearchVariant::NextPage => &self.config.endpoints.intelligence_search,
        };
        Searcher::new(Arc::clone(&self.transport), variant, url, &self.api_key)
    }

    pub fn downloader(&self) -> Downloader {
        Downloader::new(
            Arc::clone(&self.transport),
            self.pool,
            &self.config.endpoints.download,
            &self.api_key,
            ArtifactStore::new(&self.config.download_dir),
        )
    }

    /// Single lookup, outside the pool.
    pub fn report(&self, identifier: &str, allinfo: bool) -> LookupResult {
        self.report_fetcher().report(identifier, allinfo)
    }

    /// Lazy batch lookup: one [`ResultMap`] per round.
    pub fn reports<I, S>(
        &self,
        identifiers: I,
        allinfo: bool,
    ) -> Rounds<RequestGroup, impl FnMut(usize, Vec<RequestGroup>) -> ResultMap + Send>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.report_fetcher().reports(identifiers, allinfo)
    }

    /// Public (offset-paginated) search.
    pub fn search(&self, query: &str, max_results: Option<usize>) -> Result<Vec<String>, SearchError> {
        self.searcher(SearchVariant::Offset).search(query, max_results)
    }

    /// Intelligence (next-page paginated) search.
    pub fn search_intelligence(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<String>, SearchError> {
        self.searcher(SearchVariant::NextPage).search(query, max_results)
    }

    /// Lazy verified download: one list of reports per round.
    pub fn download<I, S>(
        &self,
        identifiers: I,
    ) -> Result<Rounds<String, impl FnMut(usize, Vec<String>) -> Vec<DownloadReport> + Send>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.downloader().download(identifiers)
    }
}

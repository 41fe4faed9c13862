//! Cursor-paginated hash search.
//!
//! Pages are inherently sequential (each request needs the previous
//! response's cursor), so searches bypass the worker pool. Any failed page
//! aborts the whole search.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::transport::{Method, Request, Transport, TransportError};

/// The two pagination flavours of the remote search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchVariant {
    /// Public file search: POST form, `offset` cursor.
    Offset,
    /// Intelligence search: GET query, `next_page` token sent back as `page`.
    NextPage,
}

impl SearchVariant {
    pub fn method(self) -> Method {
        match self {
            SearchVariant::Offset => Method::Post,
            SearchVariant::NextPage => Method::Get,
        }
    }

    /// Response field holding the next cursor.
    pub fn cursor_field(self) -> &'static str {
        match self {
            SearchVariant::Offset => "offset",
            SearchVariant::NextPage => "next_page",
        }
    }

    /// Request parameter carrying the cursor.
    pub fn cursor_param(self) -> &'static str {
        match self {
            SearchVariant::Offset => "offset",
            SearchVariant::NextPage => "page",
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search page {page} returned HTTP {status}")]
    Status { page: usize, status: u32 },
    #[error("search page {page} failed")]
    Transport {
        page: usize,
        #[source]
        source: TransportError,
    },
    #[error("search page {page} has an undecodable body")]
    Decode {
        page: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    hashes: Vec<String>,
    #[serde(default)]
    offset: Option<Value>,
    #[serde(default)]
    next_page: Option<Value>,
}

impl Page {
    fn cursor(&self, variant: SearchVariant) -> Option<String> {
        let raw = match variant {
            SearchVariant::Offset => self.offset.as_ref(),
            SearchVariant::NextPage => self.next_page.as_ref(),
        }?;
        match raw {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_u64() != Some(0) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Runs searches of one variant against one endpoint.
#[derive(Clone)]
pub struct Searcher {
    transport: Arc<dyn Transport>,
    url: String,
    api_key: String,
    variant: SearchVariant,
}

impl Searcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        variant: SearchVariant,
        url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            url: url.into(),
            api_key: api_key.into(),
            variant,
        }
    }

    pub fn variant(&self) -> SearchVariant {
        self.variant
    }

    fn request(&self, query: &str, cursor: Option<&str>) -> Request {
        let mut req = Request::new(self.variant.method(), &self.url)
            .param("apikey", &self.api_key)
            .param("query", query);
        if let Some(c) = cursor {
            req = req.param(self.variant.cursor_param(), c);
        }
        req
    }

    /// Collect identifiers page by page until the remote stops returning a
    /// cursor or `max` identifiers have been seen; the result is truncated
    /// to `max` and keeps first-seen order.
    ///
    /// `None` means no limit. `Some(0)` is a real limit of zero and returns
    /// an empty list without any request.
    pub fn search(&self, query: &str, max: Option<usize>) -> Result<Vec<String>, SearchError> {
        if max == Some(0) {
            return Ok(Vec::new());
        }

        let mut hashes = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0usize;
        loop {
            let req = self.request(query, cursor.as_deref());
            let resp = self
                .transport
                .call(&req)
                .map_err(|source| SearchError::Transport { page, source })?;
            if !resp.is_success() {
                return Err(SearchError::Status {
                    page,
                    status: resp.status,
                });
            }
            let body: Page = resp
                .json()
                .map_err(|source| SearchError::Decode { page, source })?;
            let next = body.cursor(self.variant);
            tracing::debug!(page, found = body.hashes.len(), more = next.is_some(), "search page");
            hashes.extend(body.hashes);
            page += 1;

            let Some(next) = next else {
                break;
            };
            if max.is_some_and(|m| hashes.len() >= m) {
                break;
            }
            cursor = Some(next);
        }

        if let Some(m) = max {
            hashes.truncate(m);
        }
        tracing::info!(pages = page, results = hashes.len(), "search complete");
        Ok(hashes)
    }
}

//! libcurl-backed transport.
//!
//! Each call checks out an easy handle from a small idle cache, so
//! keep-alive connections are reused across calls and worker threads.
//! Transient failures are retried according to the configured policy.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use curl::easy::Easy;

use super::{Method, Request, Response, Transport, TransportError};
use crate::config::VtConfig;
use crate::retry::{classify_call, run_with_retry, RetryPolicy};

/// Per-call curl settings.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl From<&VtConfig> for CurlOptions {
    fn from(cfg: &VtConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            connect_timeout: cfg.connect_timeout(),
            timeout: cfg.timeout(),
        }
    }
}

pub struct CurlTransport {
    opts: CurlOptions,
    policy: RetryPolicy,
    idle: Mutex<Vec<Easy>>,
    max_idle: usize,
}

impl CurlTransport {
    pub fn new(opts: CurlOptions, policy: RetryPolicy, max_idle: usize) -> Self {
        curl::init();
        Self {
            opts,
            policy,
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Transport sized for the configured worker count (a few spare idle
    /// handles beyond one per worker).
    pub fn from_config(cfg: &VtConfig) -> Self {
        Self::new(
            CurlOptions::from(cfg),
            RetryPolicy::from(&cfg.retry_config()),
            cfg.workers() + 4,
        )
    }

    fn idle(&self) -> MutexGuard<'_, Vec<Easy>> {
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn checkout(&self) -> Easy {
        self.idle().pop().unwrap_or_else(Easy::new)
    }

    fn checkin(&self, easy: Easy) {
        let mut idle = self.idle();
        if idle.len() < self.max_idle {
            idle.push(easy);
        }
    }

    fn perform(&self, easy: &mut Easy, req: &Request) -> Result<Response, TransportError> {
        easy.reset();
        easy.url(&req.target_url())?;
        match req.method {
            Method::Get => easy.get(true)?,
            Method::Post => {
                easy.post(true)?;
                easy.post_fields_copy(req.encoded_params().as_bytes())?;
            }
        }
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.opts.user_agent)?;
        easy.accept_encoding("gzip, deflate")?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        easy.timeout(self.opts.timeout)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        tracing::debug!(
            method = ?req.method,
            url = %req.url,
            status,
            bytes = body.len(),
            "call finished"
        );
        Ok(Response::new(status, body))
    }
}

impl Transport for CurlTransport {
    fn call(&self, request: &Request) -> Result<Response, TransportError> {
        let mut easy = self.checkout();
        let outcome = run_with_retry(
            &self.policy,
            || self.perform(&mut easy, request),
            classify_call,
        );
        match &outcome {
            Ok(_) => self.checkin(easy),
            Err(e) => tracing::warn!(url = %request.url, "call failed: {}", e),
        }
        outcome
    }
}

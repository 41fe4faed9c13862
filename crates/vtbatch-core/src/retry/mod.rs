//! Retry and backoff policy for transport calls.
//!
//! Error classification (timeouts, throttling, connection failures, 5xx)
//! and exponential backoff decisions live here so the transport can retry
//! transient failures without the batch layers knowing about it.

mod classify;
mod policy;
mod run;

pub use classify::{classify_call, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;

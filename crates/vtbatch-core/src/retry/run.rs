//! Retry loop: run a closure until its outcome is final or policy says stop.

use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// Runs `f` until `classify` reports a final outcome (`None`) or the retry
/// policy says to stop, sleeping for the backoff duration between attempts.
/// Always returns the last outcome produced by `f`.
pub fn run_with_retry<T, F, C>(policy: &RetryPolicy, mut f: F, classify: C) -> T
where
    F: FnMut() -> T,
    C: Fn(&T) -> Option<ErrorKind>,
{
    let mut attempt = 1u32;
    loop {
        let outcome = f();
        let Some(kind) = classify(&outcome) else {
            return outcome;
        };
        match policy.decide(attempt, kind) {
            RetryDecision::NoRetry => return outcome,
            RetryDecision::RetryAfter(d) => {
                tracing::debug!(attempt, ?kind, delay_ms = d.as_millis() as u64, "retrying call");
                std::thread::sleep(d);
                attempt += 1;
            }
        }
    }
}

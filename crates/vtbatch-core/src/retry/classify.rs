//! Classify HTTP status and curl errors into retry policy error kinds.

use crate::retry::policy::ErrorKind;
use crate::transport::{Response, TransportError};

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify one transport attempt. `None` means the outcome is final
/// (a 200 response); anything else is handed to the retry policy.
pub fn classify_call(outcome: &Result<Response, TransportError>) -> Option<ErrorKind> {
    match outcome {
        Ok(resp) if resp.is_success() => None,
        Ok(resp) => Some(classify_http_status(resp.status)),
        Err(TransportError::Curl(e)) => Some(classify_curl_error(e)),
        Err(_) => Some(ErrorKind::Other),
    }
}

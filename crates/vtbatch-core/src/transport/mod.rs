//! Transport boundary: one blocking request in, status + body out.
//!
//! The batch layers only ever see [`Transport`]; the shipped implementation
//! is [`CurlTransport`]. Implementations must be safe to call from several
//! worker threads at once.

mod curl_backend;

pub use curl_backend::{CurlOptions, CurlTransport};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// HTTP method used by the remote protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Parameters go into the query string.
    Get,
    /// Parameters go into a form-encoded body.
    Post,
}

/// A single request: method, base URL and ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Append a parameter (builder style).
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// First value for `key`, if present.
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parameters as `application/x-www-form-urlencoded`.
    pub fn encoded_params(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    /// URL actually requested: for GET the encoded parameters are appended
    /// to the query string, for POST the base URL is used unchanged.
    pub fn target_url(&self) -> String {
        if self.method == Method::Post || self.params.is_empty() {
            return self.url.clone();
        }
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, sep, self.encoded_params())
    }
}

/// Status code and raw (already content-decoded) body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u32,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u32, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// The remote protocols signal success with exactly HTTP 200.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A call that produced no HTTP response at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Issues one blocking request. Shared across worker threads.
pub trait Transport: Send + Sync {
    fn call(&self, request: &Request) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn call(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).call(request)
    }
}

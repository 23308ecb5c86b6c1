//! Transfer client trait and request/response types
//!
//! The blob facade never talks to the network itself; it hands a
//! [`TransferRequest`] to whatever [`TransferClient`] the application
//! injected and classifies the [`TransferResponse`] it gets back.

use crate::error::Result;
use async_trait::async_trait;
use reqwest::Method;

/// Header carrying the caller's opaque diagnostic tag.
pub const API_NAME_HEADER: &str = "x-api-name";

/// Header carrying a per-request correlation id.
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// A single HTTP-style call to be executed by the transport.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub method: Method,
    /// Endpoint-relative path (optionally with a query) or an absolute URL.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl TransferRequest {
    pub fn new<S: Into<String>>(method: Method, path: S) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// What the transport got back from the service.
#[derive(Debug, Clone)]
pub struct TransferResponse {
    pub status: u16,
    /// Final URL the request was sent to.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TransferResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Capability to execute requests against the remote service.
///
/// Implementations own the base endpoint, credentials, request signing,
/// timeouts and connection management. Errors returned here reach the
/// caller of a blob operation unmodified.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransferClient: Send + Sync {
    async fn execute(&self, request: TransferRequest) -> Result<TransferResponse>;
}

use crate::error::{BlobRelayError, Result};
use crate::transport::TransferResponse;
use reqwest::Client;
use std::time::Duration;

/// Configuration for HTTP client with proper timeouts
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: format!("blobrelay/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| BlobRelayError::network(format!("Failed to create HTTP client: {e}")))
}

/// Map a reqwest failure onto the transfer error taxonomy
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> BlobRelayError {
    let host = extract_host_from_url(url);

    if error.is_timeout() {
        return BlobRelayError::network(format!("Request to '{host}' timed out"));
    }

    if error.is_connect() {
        if is_dns_resolution_error(error) {
            return BlobRelayError::network(format!("Unable to resolve host '{host}'"));
        }
        return BlobRelayError::network(format!("Failed to connect to '{host}': {error}"));
    }

    if error.is_decode() {
        return BlobRelayError::serialization(format!(
            "Failed to decode response from '{host}': {error}"
        ));
    }

    if error.is_builder() {
        return BlobRelayError::serialization(format!(
            "Failed to build request for '{host}': {error}"
        ));
    }

    BlobRelayError::network(format!("Network error when accessing '{host}': {error}"))
}

/// Turn a non-2xx response into a classified error.
///
/// 401 and 403 are authorization failures, 404 is reported against the
/// container/blob pair the caller asked for, everything else is a rejection
/// that keeps the status and whatever text the server sent back.
pub fn error_for_status(
    response: TransferResponse,
    container: &str,
    name: &str,
) -> Result<TransferResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let message = response_message(&response);
    Err(match response.status {
        401 | 403 => BlobRelayError::auth(format!("HTTP {}: {message}", response.status)),
        404 => BlobRelayError::not_found(container, name),
        status => BlobRelayError::server_rejected(status, message),
    })
}

fn response_message(response: &TransferResponse) -> String {
    let text = String::from_utf8_lossy(&response.body);
    let text = text.trim();
    if text.is_empty() {
        format!("empty response from {}", response.url)
    } else {
        text.chars().take(512).collect()
    }
}

fn is_dns_resolution_error(error: &reqwest::Error) -> bool {
    let error_msg = error.to_string().to_lowercase();
    ["dns", "name resolution", "resolve", "nodename nor servname"]
        .iter()
        .any(|indicator| error_msg.contains(indicator))
}

/// Extract the host from a URL for error messages
pub fn extract_host_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

//! reqwest-backed transfer client
//!
//! Resolves relative paths against the configured endpoint and attaches the
//! mobile-service credentials. Absolute URLs (broker-issued SAS URIs) are
//! sent as is, and credentials are only attached when the target host is the
//! configured endpoint's host.

use crate::config::Config;
use crate::error::{BlobRelayError, Result};
use crate::transport::client::{TransferClient, TransferRequest, TransferResponse};
use crate::utils::helpers::is_absolute_url;
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

pub const APPLICATION_KEY_HEADER: &str = "X-ZUMO-APPLICATION";
pub const AUTH_TOKEN_HEADER: &str = "X-ZUMO-AUTH";

pub struct HttpTransferClient {
    http_client: Client,
    endpoint: Url,
    application_key: Option<Zeroizing<String>>,
    auth_token: Option<Zeroizing<String>>,
}

impl HttpTransferClient {
    /// Create a client for `endpoint` with the given network settings
    pub fn new(endpoint: &str, network: &NetworkConfig) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint)
            .map_err(|e| BlobRelayError::config(format!("Invalid endpoint '{endpoint}': {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(BlobRelayError::config(format!(
                "Endpoint must use http or https, got '{}'",
                endpoint.scheme()
            )));
        }
        // Url::join drops the last segment unless the base ends with a slash.
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self {
            http_client: create_http_client(network)?,
            endpoint,
            application_key: None,
            auth_token: None,
        })
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = Self::new(&config.endpoint, &config.network_config())?;
        if let Some(key) = config.application_key.as_deref().filter(|k| !k.is_empty()) {
            client = client.with_application_key(key);
        }
        if let Some(token) = config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            client = client.with_auth_token(token);
        }
        Ok(client)
    }

    pub fn with_application_key(mut self, key: &str) -> Self {
        self.application_key = Some(Zeroizing::new(key.to_string()));
        self
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(Zeroizing::new(token.to_string()));
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        if is_absolute_url(path) {
            Ok(Url::parse(path)?)
        } else {
            Ok(self.endpoint.join(path.trim_start_matches('/'))?)
        }
    }

    fn is_own_host(&self, url: &Url) -> bool {
        url.host_str() == self.endpoint.host_str()
            && url.port_or_known_default() == self.endpoint.port_or_known_default()
    }
}

#[async_trait]
impl TransferClient for HttpTransferClient {
    async fn execute(&self, request: TransferRequest) -> Result<TransferResponse> {
        let url = self.resolve(&request.path)?;
        let url_text = url.to_string();
        let attach_credentials = self.is_own_host(&url);

        debug!("{} {}", request.method, url.path());

        let mut builder = self.http_client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if attach_credentials {
            if let Some(key) = &self.application_key {
                builder = builder.header(APPLICATION_KEY_HEADER, key.as_str());
            }
            if let Some(token) = &self.auth_token {
                builder = builder.header(AUTH_TOKEN_HEADER, token.as_str());
            }
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_network_error(&e, &url_text))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_network_error(&e, &url_text))?
            .to_vec();

        debug!("{} {} -> {}", request.method, final_url, status);

        Ok(TransferResponse {
            status,
            url: final_url,
            headers,
            body,
        })
    }
}

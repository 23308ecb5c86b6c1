//! In-process blob service
//!
//! `MemoryTransferClient` answers the same requests the real service does:
//! block blob PUT/GET keyed by `container/blob`, and the resource broker's
//! `POST api/<name>?type=blob` handing out SAS-style URIs. Every request is
//! recorded so callers can assert on what was sent, and failures can be
//! queued to simulate a broken transport.

use crate::blob::models::{ResourceToken, ResourceTokenRequest};
use crate::error::{BlobRelayError, Result};
use crate::transport::client::{TransferClient, TransferRequest, TransferResponse};
use crate::utils::helpers::{blob_path, is_absolute_url};
use async_trait::async_trait;
use reqwest::Method;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::Mutex;
use url::Url;

#[derive(Default)]
struct MemoryState {
    blobs: HashMap<String, Vec<u8>>,
    denied_containers: HashSet<String>,
    failures: VecDeque<BlobRelayError>,
    requests: Vec<TransferRequest>,
}

pub struct MemoryTransferClient {
    base_url: Url,
    state: Mutex<MemoryState>,
}

impl MemoryTransferClient {
    /// Create a service rooted at `base_url`, e.g. `https://storage.example`
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        base_url.set_path("/");
        base_url.set_query(None);
        Ok(Self {
            base_url,
            state: Mutex::new(MemoryState::default()),
        })
    }

    /// Make the next request fail with `error` before it reaches the store.
    pub async fn fail_next(&self, error: BlobRelayError) {
        self.state.lock().await.failures.push_back(error);
    }

    /// Answer every blob request in `container` with 403.
    pub async fn deny_container(&self, container: &str) {
        self.state
            .lock()
            .await
            .denied_containers
            .insert(container.to_string());
    }

    pub async fn insert(&self, container: &str, name: &str, contents: Vec<u8>) {
        self.state
            .lock()
            .await
            .blobs
            .insert(blob_path(container, name), contents);
    }

    pub async fn get(&self, container: &str, name: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .await
            .blobs
            .get(&blob_path(container, name))
            .cloned()
    }

    /// Every request executed so far, in order
    pub async fn requests(&self) -> Vec<TransferRequest> {
        self.state.lock().await.requests.clone()
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        if is_absolute_url(path) {
            Ok(Url::parse(path)?)
        } else {
            Ok(self.base_url.join(path.trim_start_matches('/'))?)
        }
    }

    fn handle_broker(&self, url: &Url, request: &TransferRequest) -> TransferResponse {
        if request.method != Method::POST {
            return respond(405, url, "MethodNotAllowed");
        }
        let is_blob = url
            .query_pairs()
            .any(|(key, value)| key == "type" && value.eq_ignore_ascii_case("blob"));
        if !is_blob {
            return respond(400, url, "type parameter is invalid");
        }

        let body = request.body.as_deref().unwrap_or_default();
        let token_request: ResourceTokenRequest = match serde_json::from_slice(body) {
            Ok(parsed) => parsed,
            Err(_) => return respond(400, url, "parameters are incomplete"),
        };
        if token_request.name.trim().is_empty() || token_request.container.trim().is_empty() {
            return respond(400, url, "name or container is invalid");
        }

        let mut uri = match self
            .base_url
            .join(&blob_path(&token_request.container, &token_request.name))
        {
            Ok(uri) => uri,
            Err(_) => return respond(400, url, "invalid resource path"),
        };
        uri.query_pairs_mut()
            .append_pair("sv", "2014-02-14")
            .append_pair("sr", "b")
            .append_pair("sp", token_request.permissions.as_str())
            .append_pair("se", &token_request.expiry)
            .append_pair("sig", "memory");

        let token = ResourceToken {
            uri: uri.to_string(),
        };
        match serde_json::to_vec(&token) {
            Ok(body) => TransferResponse {
                status: 200,
                url: url.to_string(),
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body,
            },
            Err(e) => respond(500, url, &e.to_string()),
        }
    }

    fn handle_blob(
        &self,
        state: &mut MemoryState,
        url: &Url,
        request: &TransferRequest,
    ) -> TransferResponse {
        let key = url.path().trim_start_matches('/').to_string();
        let container = key.split('/').next().unwrap_or_default();
        if !key.contains('/') {
            return respond(400, url, "InvalidUri");
        }
        if state.denied_containers.contains(container) {
            return respond(403, url, "AuthenticationFailed");
        }

        match request.method {
            Method::PUT => {
                let is_block_blob = request
                    .header_value("x-ms-blob-type")
                    .is_some_and(|value| value == "BlockBlob");
                if !is_block_blob {
                    return respond(400, url, "MissingRequiredHeader");
                }
                let body = request.body.clone().unwrap_or_default();
                state.blobs.insert(key, body);
                respond(201, url, "")
            }
            Method::GET => match state.blobs.get(&key) {
                Some(contents) => TransferResponse {
                    status: 200,
                    url: url.to_string(),
                    headers: vec![(
                        "Content-Length".to_string(),
                        contents.len().to_string(),
                    )],
                    body: contents.clone(),
                },
                None => respond(404, url, "BlobNotFound"),
            },
            _ => respond(405, url, "UnsupportedHttpVerb"),
        }
    }
}

fn respond(status: u16, url: &Url, message: &str) -> TransferResponse {
    TransferResponse {
        status,
        url: url.to_string(),
        headers: Vec::new(),
        body: message.as_bytes().to_vec(),
    }
}

#[async_trait]
impl TransferClient for MemoryTransferClient {
    async fn execute(&self, request: TransferRequest) -> Result<TransferResponse> {
        let mut state = self.state.lock().await;
        state.requests.push(request.clone());

        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }

        let url = self.resolve(&request.path)?;
        if url.path().starts_with("/api/") {
            return Ok(self.handle_broker(&url, &request));
        }
        Ok(self.handle_blob(&mut state, &url, &request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let service = MemoryTransferClient::new("https://storage.example").unwrap();
        let put = TransferRequest::new(Method::PUT, "user-123/avatar.png")
            .header("x-ms-blob-type", "BlockBlob")
            .body(vec![7; 16]);
        let response = service.execute(put).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.url, "https://storage.example/user-123/avatar.png");

        let get = TransferRequest::new(Method::GET, "user-123/avatar.png");
        let response = service.execute(get).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, vec![7; 16]);
    }

    #[tokio::test]
    async fn test_put_requires_blob_type() {
        let service = MemoryTransferClient::new("https://storage.example").unwrap();
        let put = TransferRequest::new(Method::PUT, "user-123/avatar.png").body(vec![1]);
        let response = service.execute(put).await.unwrap();
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_missing_blob_is_404() {
        let service = MemoryTransferClient::new("https://storage.example").unwrap();
        let get = TransferRequest::new(Method::GET, "user-123/missing.png");
        assert_eq!(service.execute(get).await.unwrap().status, 404);
    }

    #[tokio::test]
    async fn test_queued_failure_is_returned_once() {
        let service = MemoryTransferClient::new("https://storage.example").unwrap();
        service.fail_next(BlobRelayError::network("reset")).await;

        let get = TransferRequest::new(Method::GET, "user-123/missing.png");
        assert!(service.execute(get.clone()).await.is_err());
        assert!(service.execute(get).await.is_ok());
        assert_eq!(service.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_broker_rejects_wrong_type() {
        let service = MemoryTransferClient::new("https://storage.example").unwrap();
        let post = TransferRequest::new(Method::POST, "api/resources?type=queue")
            .body(b"{}".to_vec());
        assert_eq!(service.execute(post).await.unwrap().status, 400);
    }
}

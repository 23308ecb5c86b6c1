//! Resource broker client
//!
//! In brokered mode the backend hands out short-lived SAS URIs through a
//! custom API; the blob call then goes straight to storage with that URI.

use crate::blob::models::{BlobReference, ResourcePermissions, ResourceToken, ResourceTokenRequest};
use crate::error::{BlobRelayError, Result};
use crate::transport::{TransferClient, TransferRequest, API_NAME_HEADER};
use crate::utils::helpers::{format_expiry, is_absolute_url};
use crate::utils::network::error_for_status;
use chrono::Utc;
use reqwest::Method;
use std::time::Duration;
use tracing::debug;

pub struct ResourceBroker {
    api: String,
    token_ttl: Duration,
}

impl ResourceBroker {
    pub fn new<S: Into<String>>(api: S, token_ttl: Duration) -> Self {
        Self {
            api: api.into(),
            token_ttl,
        }
    }

    /// Path of the broker's token endpoint, relative to the backend
    pub fn token_path(&self) -> String {
        format!("api/{}?type=blob", self.api.trim_matches('/'))
    }

    pub fn token_request(
        &self,
        blob: &BlobReference,
        permissions: ResourcePermissions,
    ) -> Result<ResourceTokenRequest> {
        let ttl = chrono::Duration::from_std(self.token_ttl)
            .map_err(|e| BlobRelayError::invalid_argument(format!("Token lifetime too large: {e}")))?;

        Ok(ResourceTokenRequest {
            name: blob.blob_name.clone(),
            container: blob.container_name.clone(),
            permissions,
            expiry: format_expiry(Utc::now() + ttl),
        })
    }

    /// Ask the broker for a signed URI granting `permissions` on `blob`
    pub async fn request_uri(
        &self,
        client: &dyn TransferClient,
        blob: &BlobReference,
        permissions: ResourcePermissions,
        api_name: &str,
    ) -> Result<String> {
        let body = serde_json::to_vec(&self.token_request(blob, permissions)?)?;
        let request = TransferRequest::new(Method::POST, self.token_path())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header(API_NAME_HEADER, api_name)
            .body(body);

        debug!("Requesting '{}' access to {} from broker", permissions.as_str(), blob);

        let response = client.execute(request).await?;
        let response = error_for_status(response, &blob.container_name, &blob.blob_name)
            .map_err(|e| match e {
                // The broker answers 404 when its own route is missing, not the blob.
                BlobRelayError::NotFound { .. } => BlobRelayError::server_rejected(
                    404,
                    format!("resource broker '{}' not found", self.api),
                ),
                other => other,
            })?;

        let token: ResourceToken = serde_json::from_slice(&response.body).map_err(|e| {
            BlobRelayError::serialization(format!("Invalid resource broker response: {e}"))
        })?;

        if !is_absolute_url(&token.uri) {
            return Err(BlobRelayError::serialization(format!(
                "Resource broker returned an unusable URI: '{}'",
                token.uri
            )));
        }

        Ok(token.uri)
    }
}

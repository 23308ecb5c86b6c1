//! Blob transfer client
//!
//! `BlobTransferClient` is the upload/download facade. It builds one logical
//! request per call, hands it to the injected [`TransferClient`] and turns
//! the response into either a location/content or a classified error.
//! It never retries and keeps no state between calls.

use crate::blob::broker::ResourceBroker;
use crate::blob::models::*;
use crate::error::{BlobRelayError, Result};
use crate::transport::{TransferClient, TransferRequest, API_NAME_HEADER, CLIENT_REQUEST_ID_HEADER};
use crate::utils::helpers::strip_query;
use crate::utils::network::error_for_status;
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";

#[derive(Clone)]
pub struct BlobTransferClient {
    client: Arc<dyn TransferClient>,
    options: Arc<TransferOptions>,
}

impl BlobTransferClient {
    /// Create a transfer client over `client` using direct access
    pub fn new(client: Arc<dyn TransferClient>) -> Self {
        Self::with_options(client, TransferOptions::default())
    }

    pub fn with_options(client: Arc<dyn TransferClient>, options: TransferOptions) -> Self {
        Self {
            client,
            options: Arc::new(options),
        }
    }

    /// The transport this client issues requests through
    pub fn client(&self) -> &Arc<dyn TransferClient> {
        &self.client
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Upload `contents` as `container_name/blob_name`, returning the blob's location.
    ///
    /// An existing blob with the same name is overwritten. The returned
    /// location never carries a query string, so SAS signatures are not
    /// leaked back to the caller.
    pub async fn upload_blob(
        &self,
        blob_name: &str,
        container_name: &str,
        contents: Vec<u8>,
        api_name: &str,
    ) -> Result<String> {
        self.upload(UploadRequest::new(blob_name, container_name, contents, api_name))
            .await
    }

    /// Download the full contents of `container_name/blob_name`.
    pub async fn download_blob(
        &self,
        blob_name: &str,
        container_name: &str,
        api_name: &str,
    ) -> Result<Vec<u8>> {
        self.download(DownloadRequest::new(blob_name, container_name, api_name))
            .await
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<String> {
        let UploadRequest {
            blob,
            contents,
            api_name,
        } = request;

        let result = self.put_blob(&blob, contents, &api_name).await;
        match &result {
            Ok(location) => info!("Uploaded {} ({})", blob, location),
            Err(e) => warn!("Upload of {} failed: {}", blob, e),
        }
        result
    }

    pub async fn download(&self, request: DownloadRequest) -> Result<Vec<u8>> {
        let DownloadRequest { blob, api_name } = request;

        let result = self.get_blob(&blob, &api_name).await;
        match &result {
            Ok(contents) => info!("Downloaded {} ({} bytes)", blob, contents.len()),
            Err(BlobRelayError::NotFound { .. }) => debug!("Blob {} does not exist", blob),
            Err(e) => warn!("Download of {} failed: {}", blob, e),
        }
        result
    }

    async fn put_blob(&self, blob: &BlobReference, contents: Vec<u8>, api_name: &str) -> Result<String> {
        blob.validate()?;

        let target = self
            .target_for(blob, ResourcePermissions::Write, api_name)
            .await?;
        let content_type = mime_guess::from_path(&blob.blob_name)
            .first_or_octet_stream()
            .to_string();

        debug!("Uploading {} bytes to {}", contents.len(), blob);

        let request = annotate(TransferRequest::new(Method::PUT, target), api_name)
            .header(BLOB_TYPE_HEADER, "BlockBlob")
            .header("Content-Type", content_type)
            .body(contents);

        let response = self.client.execute(request).await?;
        let response = error_for_status(response, &blob.container_name, &blob.blob_name)?;

        let location = match response.header_value("Location") {
            // A relative Location is resolved against the URL that was called
            Some(header) => Url::parse(&response.url)
                .and_then(|base| base.join(header))
                .map(String::from)
                .map_err(|e| {
                    BlobRelayError::serialization(format!(
                        "Unusable blob location '{header}': {e}"
                    ))
                })?,
            None => response.url.clone(),
        };
        let location = strip_query(&location).map_err(|e| {
            BlobRelayError::serialization(format!("Unusable blob location '{location}': {e}"))
        })?;

        Ok(location)
    }

    async fn get_blob(&self, blob: &BlobReference, api_name: &str) -> Result<Vec<u8>> {
        blob.validate()?;

        let target = self
            .target_for(blob, ResourcePermissions::Read, api_name)
            .await?;

        debug!("Downloading {}", blob);

        let request = annotate(TransferRequest::new(Method::GET, target), api_name);
        let response = self.client.execute(request).await?;
        let response = error_for_status(response, &blob.container_name, &blob.blob_name)?;

        if let Some(expected) = response
            .header_value("Content-Length")
            .and_then(|value| value.parse::<usize>().ok())
        {
            if expected != response.body.len() {
                return Err(BlobRelayError::serialization(format!(
                    "Truncated download of {blob}: expected {expected} bytes, got {}",
                    response.body.len()
                )));
            }
        }

        Ok(response.body)
    }

    /// Path or URI the blob request should go to
    async fn target_for(
        &self,
        blob: &BlobReference,
        permissions: ResourcePermissions,
        api_name: &str,
    ) -> Result<String> {
        match self.options.access {
            AccessMode::Direct => Ok(blob.path()),
            AccessMode::Brokered => {
                let broker = ResourceBroker::new(&self.options.broker_api, self.options.token_ttl);
                broker
                    .request_uri(self.client.as_ref(), blob, permissions, api_name)
                    .await
            }
        }
    }
}

fn annotate(request: TransferRequest, api_name: &str) -> TransferRequest {
    request
        .header(API_NAME_HEADER, api_name)
        .header(CLIENT_REQUEST_ID_HEADER, Uuid::new_v4().to_string())
}

/// Create a transfer client from configuration, using the HTTP transport
pub fn create_transfer_client(config: &crate::config::Config) -> Result<BlobTransferClient> {
    let transport = crate::transport::HttpTransferClient::from_config(config)?;
    Ok(BlobTransferClient::with_options(
        Arc::new(transport),
        config.transfer_options(),
    ))
}

//! Data models for blob transfer operations
//!
//! This module defines the requests passed into the transfer client and the
//! wire types exchanged with the resource broker.

use crate::error::Result;
use crate::utils::helpers::{blob_path, validate_identifier, validate_path_segments};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A blob addressed by name within a container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobReference {
    pub blob_name: String,
    pub container_name: String,
}

impl BlobReference {
    pub fn new<B: Into<String>, C: Into<String>>(blob_name: B, container_name: C) -> Self {
        Self {
            blob_name: blob_name.into(),
            container_name: container_name.into(),
        }
    }

    /// Both names must be non-empty and free of `.`/`..` segments;
    /// everything else is the service's call
    pub fn validate(&self) -> Result<()> {
        validate_identifier("blob name", &self.blob_name)?;
        validate_identifier("container name", &self.container_name)?;
        validate_path_segments("blob name", &self.blob_name)?;
        validate_path_segments("container name", &self.container_name)
    }

    /// Endpoint-relative, percent-encoded `container/blob` path
    pub fn path(&self) -> String {
        blob_path(&self.container_name, &self.blob_name)
    }
}

impl std::fmt::Display for BlobReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container_name, self.blob_name)
    }
}

/// Request for uploading a blob
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub blob: BlobReference,
    pub contents: Vec<u8>,
    pub api_name: String,
}

impl UploadRequest {
    pub fn new<B, C, A>(blob_name: B, container_name: C, contents: Vec<u8>, api_name: A) -> Self
    where
        B: Into<String>,
        C: Into<String>,
        A: Into<String>,
    {
        Self {
            blob: BlobReference::new(blob_name, container_name),
            contents,
            api_name: api_name.into(),
        }
    }
}

/// Request for downloading a blob
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub blob: BlobReference,
    pub api_name: String,
}

impl DownloadRequest {
    pub fn new<B, C, A>(blob_name: B, container_name: C, api_name: A) -> Self
    where
        B: Into<String>,
        C: Into<String>,
        A: Into<String>,
    {
        Self {
            blob: BlobReference::new(blob_name, container_name),
            api_name: api_name.into(),
        }
    }
}

/// How blob requests reach storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// `PUT`/`GET` on `container/blob` relative to the transport's endpoint
    #[default]
    Direct,
    /// Ask the backend's resource broker for a SAS URI first, then call it
    Brokered,
}

impl std::str::FromStr for AccessMode {
    type Err = crate::error::BlobRelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "brokered" => Ok(Self::Brokered),
            other => Err(crate::error::BlobRelayError::config(format!(
                "Unknown access mode '{other}', expected 'direct' or 'brokered'"
            ))),
        }
    }
}

/// Permissions the resource broker can grant on a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourcePermissions {
    #[serde(rename = "r")]
    Read,
    #[serde(rename = "w")]
    Write,
    #[serde(rename = "rw", alias = "wr")]
    ReadWrite,
}

impl ResourcePermissions {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::Write => "w",
            Self::ReadWrite => "rw",
        }
    }
}

/// Body of the broker's `POST api/<name>?type=blob`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTokenRequest {
    pub name: String,
    pub container: String,
    pub permissions: ResourcePermissions,
    pub expiry: String,
}

/// Broker response carrying the signed blob URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceToken {
    pub uri: String,
}

/// Options that shape how the transfer client addresses storage
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub access: AccessMode,
    /// Custom API name of the resource broker, as in `api/<broker_api>`
    pub broker_api: String,
    /// Lifetime requested for broker-issued SAS URIs
    pub token_ttl: Duration,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            access: AccessMode::Direct,
            broker_api: "resources".to_string(),
            token_ttl: Duration::from_secs(300),
        }
    }
}

//! blobrelay - blob upload/download client
//!
//! A transfer facade that moves blobs to and from object storage through an
//! injected transport, either directly or via a backend resource broker
//! that issues shared-access URIs.

pub mod blob;
pub mod cli;
pub mod config;
pub mod error;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use blob::{BlobTransferClient, Completion, DownloadRequest, UploadRequest};
pub use error::{BlobRelayError, ErrorKind, Result};
pub use transport::{HttpTransferClient, MemoryTransferClient, TransferClient};

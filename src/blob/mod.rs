//! Blob upload and download
//!
//! This module provides the transfer facade, its completion surfaces and
//! the resource broker used in brokered access mode.

pub mod broker;
pub mod manager;
pub mod models;
pub mod operations;

// Re-export commonly used types
pub use broker::ResourceBroker;
pub use manager::{create_transfer_client, BlobTransferClient};
pub use models::*;
pub use operations::Completion;

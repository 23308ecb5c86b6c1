//! Transport layer
//!
//! The capability trait the blob facade depends on, a reqwest
//! implementation for real endpoints and an in-memory implementation that
//! behaves like the blob service for tests and local development.

pub mod client;
pub mod http;
pub mod memory;

pub use client::*;
pub use http::HttpTransferClient;
pub use memory::MemoryTransferClient;

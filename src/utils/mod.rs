//! Utility functions module
//!
//! HTTP client construction, error classification and path helpers.

pub mod helpers;
pub mod network;

pub use helpers::*;
pub use network::*;

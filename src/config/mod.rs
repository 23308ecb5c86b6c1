//! Configuration management module
//!
//! Configuration comes from command-line flags, environment variables,
//! a configuration file and default values, in that priority order.

pub mod settings;

pub use settings::*;

//! Core relay primitives shared across sockpipe crates.
//!
//! This crate provides:
//! - The [`io::Endpoint`] capability contract and a stream-backed implementation
//! - The backpressure-aware bidirectional [`io::Relay`]
//! - Default configuration values
//! - Error types and error labels for logging

pub mod defaults;
pub mod error;
pub mod errors;
pub mod io;

// Re-export commonly used items at crate root
pub use defaults::*;
pub use error::{RelayError, TransportError};
pub use errors::*;

/// Project name.
pub const PROJECT_NAME: &str = "sockpipe";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

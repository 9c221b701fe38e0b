//! Error type labels for logging.
//!
//! These constants provide consistent error classification across all crates.

/// I/O error on an established connection.
pub const ERROR_IO: &str = "io";
/// Relay construction rejected (missing endpoint).
pub const ERROR_VALIDATION: &str = "validation";
/// Failure dialing a target.
pub const ERROR_CONNECT: &str = "connect";
/// DNS/address resolution error.
pub const ERROR_RESOLVE: &str = "resolve";
/// Timeout error.
pub const ERROR_TIMEOUT: &str = "timeout";
/// Configuration error.
pub const ERROR_CONFIG: &str = "config";

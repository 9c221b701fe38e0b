//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Endpoint Buffer Defaults
// ============================================================================

/// Default read chunk size for stream endpoints (32 KiB).
pub const DEFAULT_READ_CHUNK_SIZE: usize = 32768;
/// Default outgoing soft limit before `write` reports backpressure (16 KiB).
pub const DEFAULT_SOFT_LIMIT: usize = 16384;

// ============================================================================
// TCP Socket Defaults
// ============================================================================

/// Default TCP_NODELAY (disable Nagle's algorithm for lower latency).
pub const DEFAULT_TCP_NO_DELAY: bool = true;

// ============================================================================
// Timeout Defaults
// ============================================================================

/// Default timeout for dialing the forward target, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Diagnostics
// ============================================================================

/// Default state of the relay diagnostic sink.
pub const DEFAULT_VERBOSE: bool = false;
/// `tracing` target used by the default diagnostic sink.
pub const DIAGNOSTIC_TARGET: &str = "sockpipe::relay";

//! # sockpipe
//!
//! Bidirectional byte relay between two established connections, with
//! per-direction backpressure and coordinated teardown.
//!
//! ## Crates
//!
//! - [`sockpipe_core`] - Endpoint contract, relay, defaults
//! - [`sockpipe_forward`] - TCP port forwarder built on the relay

pub use sockpipe_core as core;
pub use sockpipe_forward as forward;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sockpipe_core::io::{Endpoint, Relay, RelayReport, StreamEndpoint};
    pub use sockpipe_core::{RelayError, TransportError};
    pub use sockpipe_forward::{CancellationToken, ForwardConfig, Forwarder};
}

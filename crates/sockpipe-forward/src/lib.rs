//! TCP port forwarder built on the sockpipe relay.
//!
//! Each `[[rules]]` entry binds a listen address; every accepted connection
//! is paired with a fresh connection to the rule's target and handed to
//! [`sockpipe_core::io::Relay`].

pub mod cli;
pub mod config;
pub mod error;
pub mod forward;

pub use cli::ForwardArgs;
pub use config::ForwardConfig;
pub use error::{ConfigError, ForwardError};
pub use forward::Forwarder;
pub use tokio_util::sync::CancellationToken;

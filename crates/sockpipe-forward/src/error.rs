//! Error types for the forward crate.

use std::io;
use std::path::PathBuf;

use sockpipe_core::{
    ERROR_CONFIG, ERROR_CONNECT, ERROR_IO, ERROR_RESOLVE, ERROR_TIMEOUT, ERROR_VALIDATION,
    RelayError,
};
use thiserror::Error;

/// Errors loading or validating a forward config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

/// Errors that can occur while forwarding.
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("connect timeout to {0}")]
    ConnectTimeout(String),

    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
}

impl ForwardError {
    /// Stable label for the `error_type` log field.
    pub fn error_type(&self) -> &'static str {
        match self {
            ForwardError::Io(_) => ERROR_IO,
            ForwardError::Config(_) => ERROR_CONFIG,
            ForwardError::Resolve { .. } => ERROR_RESOLVE,
            ForwardError::Connect { .. } => ERROR_CONNECT,
            ForwardError::ConnectTimeout(_) => ERROR_TIMEOUT,
            ForwardError::Relay(_) => ERROR_VALIDATION,
        }
    }
}

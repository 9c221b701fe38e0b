//! Error types for the relay.

use std::fmt;
use std::io;

use thiserror::Error;

/// One of the two endpoints handed to a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Endpoint A.
    Local,
    /// Endpoint B.
    Remote,
}

impl Side {
    /// The other endpoint.
    pub fn peer(self) -> Side {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => f.write_str("local"),
            Side::Remote => f.write_str("remote"),
        }
    }
}

/// Errors returned when building a relay.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("missing valid {0} endpoint")]
    MissingEndpoint(Side),
}

/// A read, write, drain or close failure reported by one endpoint.
///
/// Never returned to the caller of [`Relay::run`](crate::io::Relay::run);
/// it ends up in the [`Termination`](crate::io::Termination) of the report.
#[derive(Error, Debug)]
#[error("{side} endpoint transport error: {source}")]
pub struct TransportError {
    pub side: Side,
    #[source]
    pub source: io::Error,
}

impl TransportError {
    pub fn new(side: Side, source: io::Error) -> Self {
        Self { side, source }
    }
}

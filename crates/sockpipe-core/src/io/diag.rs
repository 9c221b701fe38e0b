//! Human-readable relay diagnostics.
//!
//! When enabled, the relay emits one line per event:
//!
//! ```text
//! 10.0.0.1:5000 -> 10.0.0.2:80 : writing data
//! 10.0.0.1:5000 <- 10.0.0.2:80 : destination buffer full; pausing source
//! ```
//!
//! `->` marks events of the local → remote direction, `<-` the reverse.

use std::fmt;
use std::io;
use std::sync::Arc;

use crate::defaults::DIAGNOSTIC_TARGET;
use crate::error::Side;

/// Direction of a flow between the two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    LocalToRemote,
    RemoteToLocal,
}

impl Direction {
    /// The endpoint bytes are read from.
    pub fn source(self) -> Side {
        match self {
            Direction::LocalToRemote => Side::Local,
            Direction::RemoteToLocal => Side::Remote,
        }
    }

    /// The endpoint bytes are written to.
    pub fn destination(self) -> Side {
        self.source().peer()
    }

    /// Direction whose source is `side`.
    pub fn from_source(side: Side) -> Self {
        match side {
            Side::Local => Direction::LocalToRemote,
            Side::Remote => Direction::RemoteToLocal,
        }
    }

    fn arrow(self) -> &'static str {
        match self {
            Direction::LocalToRemote => "->",
            Direction::RemoteToLocal => "<-",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::LocalToRemote => f.write_str("local->remote"),
            Direction::RemoteToLocal => f.write_str("remote->local"),
        }
    }
}

/// Event reported to the diagnostic sink.
#[derive(Debug)]
pub enum RelayEvent<'a> {
    /// A chunk is being written to the destination.
    Forwarding { bytes: usize },
    /// The destination reported buffer-full; the source was paused.
    Paused,
    /// The destination drained; the source was resumed.
    Resumed,
    /// The source closed; the peer is being ended.
    Closing,
    /// The endpoint errored; the peer is being ended.
    Errored(&'a io::Error),
}

impl fmt::Display for RelayEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayEvent::Forwarding { bytes } => write!(f, "writing data ({bytes}B)"),
            RelayEvent::Paused => f.write_str("destination buffer full; pausing source"),
            RelayEvent::Resumed => f.write_str("buffer drained; resuming source"),
            RelayEvent::Closing => f.write_str("closing the socket"),
            RelayEvent::Errored(e) => write!(f, "closing due to error - {e}"),
        }
    }
}

/// Receiver of formatted diagnostic lines.
pub trait DiagnosticSink: Send + Sync {
    fn line(&self, line: &str);
}

/// Default sink: writes every line through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn line(&self, line: &str) {
        tracing::info!(target: DIAGNOSTIC_TARGET, "{line}");
    }
}

/// Labels of both endpoints plus the optional sink.
pub(crate) struct Diagnostics {
    sink: Option<Arc<dyn DiagnosticSink>>,
    local: String,
    remote: String,
}

impl Diagnostics {
    pub(crate) fn new(sink: Option<Arc<dyn DiagnosticSink>>, local: String, remote: String) -> Self {
        Self {
            sink,
            local,
            remote,
        }
    }

    pub(crate) fn local(&self) -> &str {
        &self.local
    }

    pub(crate) fn remote(&self) -> &str {
        &self.remote
    }

    #[inline]
    pub(crate) fn emit(&self, direction: Direction, event: RelayEvent<'_>) {
        if let Some(sink) = &self.sink {
            let line = format!(
                "{} {} {} : {}",
                self.local,
                direction.arrow(),
                self.remote,
                event
            );
            sink.line(&line);
        }
    }
}

//! Bidirectional relay between two endpoints with configurable metrics.
//!
//! Each direction is driven as an independent poll-based state machine within
//! a single future, so back-pressure on one direction never stalls the other.
//! The first close or error observed on either endpoint stops both directions
//! and the surviving endpoint is ended gracefully. Output already accepted by
//! a closed endpoint is flushed before the relay returns.
//!
//! Metrics recording is abstracted via the `RelayMetrics` trait, allowing each
//! caller to provide its own backend.

use std::future::poll_fn;
use std::sync::Arc;
use std::task::Poll;

use tracing::debug;

use super::diag::{DiagnosticSink, Diagnostics, Direction, TracingSink};
use super::endpoint::Endpoint;
use super::flow::{Flow, FlowPoll};
use super::lifecycle::{Termination, propagate};
use crate::error::{RelayError, Side};

/// Trait for recording relay metrics.
pub trait RelayMetrics {
    /// Record bytes handed to the destination of `direction`.
    fn record_forwarded(&self, direction: Direction, bytes: u64);
    /// Record that the source of `direction` was paused for backpressure.
    fn record_pause(&self, _direction: Direction) {}
}

/// No-op metrics implementation for cases where metrics aren't needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl RelayMetrics for NoOpMetrics {
    #[inline]
    fn record_forwarded(&self, _direction: Direction, _bytes: u64) {}
}

impl<M: RelayMetrics + ?Sized> RelayMetrics for Arc<M> {
    fn record_forwarded(&self, direction: Direction, bytes: u64) {
        (**self).record_forwarded(direction, bytes)
    }

    fn record_pause(&self, direction: Direction) {
        (**self).record_pause(direction)
    }
}

/// Counters for one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowStats {
    pub bytes: u64,
    pub chunks: u64,
    pub pauses: u64,
}

impl FlowStats {
    fn record(&mut self, bytes: usize, paused: bool) {
        self.bytes += bytes as u64;
        self.chunks += 1;
        if paused {
            self.pauses += 1;
        }
    }
}

/// Outcome of a finished relay.
#[derive(Debug)]
pub struct RelayReport {
    pub local_to_remote: FlowStats,
    pub remote_to_local: FlowStats,
    pub termination: Termination,
}

impl RelayReport {
    pub fn stats(&self, direction: Direction) -> FlowStats {
        match direction {
            Direction::LocalToRemote => self.local_to_remote,
            Direction::RemoteToLocal => self.remote_to_local,
        }
    }
}

/// Builder for [`Relay`]. Both endpoints are required.
pub struct RelayBuilder<L, R, M = NoOpMetrics> {
    local: Option<L>,
    remote: Option<R>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    metrics: M,
}

impl<L, R> RelayBuilder<L, R> {
    pub fn new() -> Self {
        Self {
            local: None,
            remote: None,
            sink: None,
            metrics: NoOpMetrics,
        }
    }
}

impl<L, R> Default for RelayBuilder<L, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, R, M> RelayBuilder<L, R, M>
where
    L: Endpoint,
    R: Endpoint,
    M: RelayMetrics,
{
    /// Endpoint A.
    pub fn local(mut self, local: L) -> Self {
        self.local = Some(local);
        self
    }

    /// Endpoint B.
    pub fn remote(mut self, remote: R) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Enable or disable diagnostic lines through [`TracingSink`].
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.sink = if verbose {
            Some(Arc::new(TracingSink))
        } else {
            None
        };
        self
    }

    /// Send diagnostic lines to a custom sink.
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn metrics<M2: RelayMetrics>(self, metrics: M2) -> RelayBuilder<L, R, M2> {
        RelayBuilder {
            local: self.local,
            remote: self.remote,
            sink: self.sink,
            metrics,
        }
    }

    /// Validate that both endpoints are present.
    ///
    /// No endpoint operation is invoked when this fails.
    pub fn build(self) -> Result<Relay<L, R, M>, RelayError> {
        let local = self.local.ok_or(RelayError::MissingEndpoint(Side::Local))?;
        let remote = self.remote.ok_or(RelayError::MissingEndpoint(Side::Remote))?;

        let diag = Diagnostics::new(self.sink, local.peer_label(), remote.peer_label());
        Ok(Relay {
            local,
            remote,
            diag,
            metrics: self.metrics,
        })
    }
}

/// Two endpoints wired together: local → remote and remote → local.
pub struct Relay<L, R, M = NoOpMetrics> {
    local: L,
    remote: R,
    diag: Diagnostics,
    metrics: M,
}

impl<L, R> Relay<L, R>
where
    L: Endpoint,
    R: Endpoint,
{
    pub fn builder() -> RelayBuilder<L, R> {
        RelayBuilder::new()
    }

    /// Build a relay from optionally-present endpoints.
    ///
    /// Fails with [`RelayError::MissingEndpoint`] if either is `None`.
    pub fn new(local: Option<L>, remote: Option<R>, verbose: bool) -> Result<Self, RelayError> {
        let mut builder = RelayBuilder::new().verbose(verbose);
        builder.local = local;
        builder.remote = remote;
        builder.build()
    }
}

impl<L, R, M> Relay<L, R, M>
where
    L: Endpoint,
    R: Endpoint,
    M: RelayMetrics,
{
    /// Relay until either endpoint closes or fails, then end the other one.
    ///
    /// Transport errors never surface as `Err`; they are reported through the
    /// diagnostic sink and recorded in [`RelayReport::termination`].
    pub async fn run(self) -> RelayReport {
        let Relay {
            mut local,
            mut remote,
            diag,
            metrics,
        } = self;

        debug!(local = diag.local(), remote = diag.remote(), "relay started");

        let mut outbound = Flow::new(Direction::LocalToRemote);
        let mut inbound = Flow::new(Direction::RemoteToLocal);
        let mut local_to_remote = FlowStats::default();
        let mut remote_to_local = FlowStats::default();

        let termination = loop {
            // Poll both directions; each registers its own wakers so either
            // can make progress independently.
            let step = poll_fn(|cx| {
                let mut progressed = false;

                match outbound.poll_forward(cx, &mut local, &mut remote, &diag) {
                    Poll::Ready(FlowPoll::Forwarded { bytes, paused }) => {
                        local_to_remote.record(bytes, paused);
                        record(&metrics, Direction::LocalToRemote, bytes, paused);
                        progressed = true;
                    }
                    Poll::Ready(FlowPoll::Terminated(t)) => return Poll::Ready(Some(t)),
                    Poll::Pending => {}
                }

                match inbound.poll_forward(cx, &mut remote, &mut local, &diag) {
                    Poll::Ready(FlowPoll::Forwarded { bytes, paused }) => {
                        remote_to_local.record(bytes, paused);
                        record(&metrics, Direction::RemoteToLocal, bytes, paused);
                        progressed = true;
                    }
                    Poll::Ready(FlowPoll::Terminated(t)) => return Poll::Ready(Some(t)),
                    Poll::Pending => {}
                }

                if progressed {
                    Poll::Ready(None)
                } else {
                    Poll::Pending
                }
            })
            .await;

            if let Some(termination) = step {
                break termination;
            }
        };

        match termination.side {
            Side::Local => propagate(&termination, &mut local, &mut remote, &diag).await,
            Side::Remote => propagate(&termination, &mut remote, &mut local, &diag).await,
        }

        debug!(
            local = diag.local(),
            remote = diag.remote(),
            sent = local_to_remote.bytes,
            received = remote_to_local.bytes,
            "relay finished"
        );

        RelayReport {
            local_to_remote,
            remote_to_local,
            termination,
        }
    }
}

#[inline]
fn record<M: RelayMetrics>(metrics: &M, direction: Direction, bytes: usize, paused: bool) {
    metrics.record_forwarded(direction, bytes as u64);
    if paused {
        metrics.record_pause(direction);
    }
}

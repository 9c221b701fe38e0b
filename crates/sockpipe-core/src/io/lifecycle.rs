//! Termination bookkeeping and propagation to the surviving endpoint.

use std::future::poll_fn;
use std::task::Poll;

use tracing::debug;

use super::diag::{Diagnostics, Direction, RelayEvent};
use super::endpoint::Endpoint;
use crate::error::{Side, TransportError};
use crate::errors::ERROR_IO;

/// Why the relay stopped.
#[derive(Debug)]
pub enum TerminationCause {
    /// The endpoint's stream closed.
    Closed,
    /// The endpoint reported a transport error.
    Errored(TransportError),
}

/// The first terminal signal observed, and from which endpoint.
#[derive(Debug)]
pub struct Termination {
    pub side: Side,
    pub cause: TerminationCause,
}

impl Termination {
    pub fn closed(side: Side) -> Self {
        Self {
            side,
            cause: TerminationCause::Closed,
        }
    }

    pub fn errored(side: Side, source: std::io::Error) -> Self {
        Self {
            side,
            cause: TerminationCause::Errored(TransportError::new(side, source)),
        }
    }

    /// The transport error, if the endpoint failed rather than closed.
    pub fn error(&self) -> Option<&TransportError> {
        match &self.cause {
            TerminationCause::Closed => None,
            TerminationCause::Errored(e) => Some(e),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }
}

/// End `peer` once and wait for its pending output to finish.
///
/// A `terminated` endpoint that closed (rather than failed) may still hold
/// output it accepted earlier; its drain is driven alongside the peer's so
/// those bytes reach the wire too. It is never ended. Failures on either side
/// are logged and swallowed: both endpoints are going away.
pub(crate) async fn propagate<T, P>(
    termination: &Termination,
    terminated: &mut T,
    peer: &mut P,
    diag: &Diagnostics,
) where
    T: Endpoint + ?Sized,
    P: Endpoint + ?Sized,
{
    let direction = Direction::from_source(termination.side);
    match &termination.cause {
        TerminationCause::Closed => {
            diag.emit(direction, RelayEvent::Closing);
            debug!(side = %termination.side, "endpoint closed, ending peer");
        }
        TerminationCause::Errored(e) => {
            diag.emit(direction, RelayEvent::Errored(&e.source));
            debug!(
                side = %termination.side,
                error = %e.source,
                error_type = ERROR_IO,
                "endpoint failed, ending peer"
            );
        }
    }

    peer.end();

    let mut peer_done = false;
    let mut terminated_done = termination.is_error();
    poll_fn(|cx| {
        if !peer_done {
            if let Poll::Ready(result) = peer.poll_drain(cx) {
                if let Err(e) = result {
                    debug!(
                        side = %termination.side.peer(),
                        error = %e,
                        error_type = ERROR_IO,
                        "peer failed while ending"
                    );
                }
                peer_done = true;
            }
        }
        if !terminated_done {
            if let Poll::Ready(result) = terminated.poll_drain(cx) {
                if let Err(e) = result {
                    debug!(
                        side = %termination.side,
                        error = %e,
                        error_type = ERROR_IO,
                        "closed endpoint failed while flushing"
                    );
                }
                terminated_done = true;
            }
        }

        if peer_done && terminated_done {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    })
    .await;
}

//! One direction of the relay: source → destination with backpressure.

use std::task::{Context, Poll};

use super::diag::{Diagnostics, Direction, RelayEvent};
use super::endpoint::Endpoint;
use super::lifecycle::Termination;

/// Whether a flow is currently consuming its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowState {
    Flowing,
    /// The last write reported buffer-full; waiting for the destination to drain.
    Paused,
}

/// Result of polling one flow.
pub(crate) enum FlowPoll {
    /// A chunk was handed to the destination.
    Forwarded { bytes: usize, paused: bool },
    /// One of the two endpoints closed or failed.
    Terminated(Termination),
}

pub(crate) struct Flow {
    direction: Direction,
    state: FlowState,
}

impl Flow {
    pub(crate) fn new(direction: Direction) -> Self {
        Self {
            direction,
            state: FlowState::Flowing,
        }
    }

    /// Poll-driven forwarding step: drain → (resume) → read → write → (pause).
    ///
    /// The destination's output is driven on every poll so queued bytes keep
    /// moving even while the source is idle. A paused flow reads no data from
    /// its source until the destination reports drained; it only watches the
    /// source for close or error.
    pub(crate) fn poll_forward<S, D>(
        &mut self,
        cx: &mut Context<'_>,
        source: &mut S,
        destination: &mut D,
        diag: &Diagnostics,
    ) -> Poll<FlowPoll>
    where
        S: Endpoint + ?Sized,
        D: Endpoint + ?Sized,
    {
        loop {
            match destination.poll_drain(cx) {
                Poll::Ready(Ok(())) => {
                    if self.state == FlowState::Paused {
                        diag.emit(self.direction, RelayEvent::Resumed);
                        source.resume();
                        self.state = FlowState::Flowing;
                    }
                }
                Poll::Ready(Err(e)) => {
                    return Poll::Ready(FlowPoll::Terminated(Termination::errored(
                        self.direction.destination(),
                        e,
                    )));
                }
                Poll::Pending => {}
            }

            if self.state == FlowState::Paused {
                // No data while paused, but close and error still count.
                return match source.poll_closed(cx) {
                    Poll::Ready(Ok(())) => Poll::Ready(FlowPoll::Terminated(
                        Termination::closed(self.direction.source()),
                    )),
                    Poll::Ready(Err(e)) => Poll::Ready(FlowPoll::Terminated(
                        Termination::errored(self.direction.source(), e),
                    )),
                    Poll::Pending => Poll::Pending,
                };
            }

            let chunk = match source.poll_data(cx) {
                Poll::Ready(Some(Ok(chunk))) => chunk,
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(FlowPoll::Terminated(Termination::errored(
                        self.direction.source(),
                        e,
                    )));
                }
                Poll::Ready(None) => {
                    return Poll::Ready(FlowPoll::Terminated(Termination::closed(
                        self.direction.source(),
                    )));
                }
                Poll::Pending => return Poll::Pending,
            };
            if chunk.is_empty() {
                continue;
            }

            let bytes = chunk.len();
            diag.emit(self.direction, RelayEvent::Forwarding { bytes });
            match destination.write(chunk) {
                Ok(true) => {
                    return Poll::Ready(FlowPoll::Forwarded {
                        bytes,
                        paused: false,
                    });
                }
                Ok(false) => {
                    diag.emit(self.direction, RelayEvent::Paused);
                    source.pause();
                    self.state = FlowState::Paused;
                    return Poll::Ready(FlowPoll::Forwarded {
                        bytes,
                        paused: true,
                    });
                }
                Err(e) => {
                    return Poll::Ready(FlowPoll::Terminated(Termination::errored(
                        self.direction.destination(),
                        e,
                    )));
                }
            }
        }
    }
}

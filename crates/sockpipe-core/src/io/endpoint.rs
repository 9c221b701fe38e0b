//! The endpoint capability contract.

use std::io;
use std::task::{Context, Poll};

use bytes::Bytes;

/// One side of a duplex byte stream, as seen by the relay.
///
/// The relay drives an endpoint only through these operations:
///
/// | signal / action | method |
/// |---|---|
/// | data arrived | `poll_data` → `Ready(Some(Ok(chunk)))` |
/// | closed | `poll_data` → `Ready(None)`, or `poll_closed` → `Ready(Ok(()))` while paused |
/// | errored | `poll_data` → `Ready(Some(Err(_)))`, `poll_closed` → `Ready(Err(_))`, or an error from `write` / `poll_drain` |
/// | write | `write`, returns `false` once the send buffer is over its soft limit |
/// | suspend / resume reads | `pause` / `resume` |
/// | drained | `poll_drain` → `Ready(Ok(()))` |
/// | graceful close | `end`, then `poll_drain` until ready |
///
/// Buffer sizes are an implementation policy of the endpoint; the relay only
/// reacts to the flag returned by `write`.
pub trait Endpoint {
    /// Identity used in diagnostic lines, e.g. `"10.0.0.1:443"`.
    fn peer_label(&self) -> String;

    /// Poll for the next chunk of incoming bytes.
    ///
    /// Returns `Ready(None)` once the stream is closed. Chunks are never empty.
    /// While paused an endpoint may return `Pending` even if data is available.
    fn poll_data(&mut self, cx: &mut Context<'_>) -> Poll<Option<io::Result<Bytes>>>;

    /// Watch the read side for close or error without delivering data.
    ///
    /// Polled instead of [`poll_data`](Self::poll_data) while the endpoint is
    /// paused. Returns `Ready(Ok(()))` once the stream is closed,
    /// `Ready(Err(_))` on a transport error and `Pending` while it is still
    /// open. Data arriving meanwhile stays with the endpoint and is delivered
    /// by `poll_data` after [`resume`](Self::resume).
    fn poll_closed(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;

    /// Queue `chunk` for sending.
    ///
    /// Returns `Ok(false)` when the outgoing buffer is at or above the soft
    /// limit. The chunk is accepted either way.
    fn write(&mut self, chunk: Bytes) -> io::Result<bool>;

    /// Stop delivering incoming data until [`resume`](Self::resume).
    fn pause(&mut self);

    /// Resume delivering incoming data.
    fn resume(&mut self);

    /// Push queued output towards the transport.
    ///
    /// Ready once the outgoing buffer is fully drained. After
    /// [`end`](Self::end) it is ready only once the stream is also closed.
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;

    /// Finish pending writes, then close the stream.
    ///
    /// Never discards queued output. Completion is observed through
    /// [`poll_drain`](Self::poll_drain).
    fn end(&mut self);
}

impl<E: Endpoint + ?Sized> Endpoint for &mut E {
    fn peer_label(&self) -> String {
        (**self).peer_label()
    }

    fn poll_data(&mut self, cx: &mut Context<'_>) -> Poll<Option<io::Result<Bytes>>> {
        (**self).poll_data(cx)
    }

    fn poll_closed(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        (**self).poll_closed(cx)
    }

    fn write(&mut self, chunk: Bytes) -> io::Result<bool> {
        (**self).write(chunk)
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn resume(&mut self) {
        (**self).resume()
    }

    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        (**self).poll_drain(cx)
    }

    fn end(&mut self) {
        (**self).end()
    }
}

impl<E: Endpoint + ?Sized> Endpoint for Box<E> {
    fn peer_label(&self) -> String {
        (**self).peer_label()
    }

    fn poll_data(&mut self, cx: &mut Context<'_>) -> Poll<Option<io::Result<Bytes>>> {
        (**self).poll_data(cx)
    }

    fn poll_closed(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        (**self).poll_closed(cx)
    }

    fn write(&mut self, chunk: Bytes) -> io::Result<bool> {
        (**self).write(chunk)
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn resume(&mut self) {
        (**self).resume()
    }

    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        (**self).poll_drain(cx)
    }

    fn end(&mut self) {
        (**self).end()
    }
}

//! `Endpoint` implementation over a tokio stream.
//!
//! `StreamEndpoint` turns any `AsyncRead + AsyncWrite` into the push-style
//! capability set the relay expects: reads are delivered as chunks, writes
//! are queued in an outgoing buffer with a soft limit, and the buffer is
//! pushed to the stream whenever the relay polls for drain.
//!
//! While paused the endpoint keeps reading into its chunk buffer, up to one
//! `read_chunk_size`, so a close or error that follows shortly behind the
//! last delivered data is still reported through `poll_closed`. Anything
//! beyond that chunk stays in the stream until the endpoint is resumed.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, Waker, ready};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::io::poll_read_buf;

use super::endpoint::Endpoint;
use crate::defaults::{DEFAULT_READ_CHUNK_SIZE, DEFAULT_SOFT_LIMIT};

/// A stream wrapped as a relay endpoint.
///
/// The soft limit is advisory: `write` always accepts the chunk and only
/// reports whether the queued output reached the limit, so one oversized
/// chunk is buffered in full.
pub struct StreamEndpoint<S> {
    stream: S,
    label: String,
    read_buf: BytesMut,
    read_chunk_size: usize,
    outgoing: BytesMut,
    soft_limit: usize,
    paused: bool,
    read_waker: Option<Waker>,
    read_closed: bool,
    ending: bool,
    shutdown: bool,
}

impl<S> StreamEndpoint<S> {
    /// Wrap `stream` with default read chunk size and soft limit.
    pub fn new(stream: S, label: impl Into<String>) -> Self {
        Self::with_limits(stream, label, DEFAULT_READ_CHUNK_SIZE, DEFAULT_SOFT_LIMIT)
    }

    /// Wrap `stream` with explicit buffer policy.
    ///
    /// # Arguments
    ///
    /// * `read_chunk_size` - Maximum bytes delivered per `poll_data` chunk
    /// * `soft_limit` - Queued output size at which `write` reports `false`
    pub fn with_limits(
        stream: S,
        label: impl Into<String>,
        read_chunk_size: usize,
        soft_limit: usize,
    ) -> Self {
        Self {
            stream,
            label: label.into(),
            read_buf: BytesMut::new(),
            read_chunk_size: read_chunk_size.max(1),
            outgoing: BytesMut::new(),
            soft_limit,
            paused: false,
            read_waker: None,
            read_closed: false,
            ending: false,
            shutdown: false,
        }
    }

    /// Bytes queued but not yet written to the stream.
    pub fn buffered(&self) -> usize {
        self.outgoing.len()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl<S: AsyncRead + Unpin> StreamEndpoint<S> {
    /// Read into `read_buf` without letting it grow past one chunk.
    fn poll_fill(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<usize>> {
        let room = self.read_chunk_size - self.read_buf.len();
        self.read_buf.reserve(room);
        let mut limited = (&mut self.read_buf).limit(room);
        poll_read_buf(Pin::new(&mut self.stream), cx, &mut limited)
    }
}

impl StreamEndpoint<TcpStream> {
    /// Wrap a connected TCP stream, labelled with its peer address.
    pub fn tcp(stream: TcpStream, read_chunk_size: usize, soft_limit: usize) -> io::Result<Self> {
        let label = stream.peer_addr()?.to_string();
        Ok(Self::with_limits(stream, label, read_chunk_size, soft_limit))
    }
}

impl<S> Endpoint for StreamEndpoint<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn peer_label(&self) -> String {
        self.label.clone()
    }

    fn poll_data(&mut self, cx: &mut Context<'_>) -> Poll<Option<io::Result<Bytes>>> {
        if self.paused {
            self.read_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
        // Bytes read ahead while paused go out first.
        if !self.read_buf.is_empty() {
            return Poll::Ready(Some(Ok(self.read_buf.split().freeze())));
        }
        if self.read_closed {
            return Poll::Ready(None);
        }

        match ready!(self.poll_fill(cx)) {
            Ok(0) => {
                self.read_closed = true;
                Poll::Ready(None)
            }
            Ok(_) => Poll::Ready(Some(Ok(self.read_buf.split().freeze()))),
            Err(e) => Poll::Ready(Some(Err(e))),
        }
    }

    fn poll_closed(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.read_closed {
            return Poll::Ready(Ok(()));
        }
        while self.read_buf.len() < self.read_chunk_size {
            match ready!(self.poll_fill(cx)) {
                Ok(0) => {
                    self.read_closed = true;
                    return Poll::Ready(Ok(()));
                }
                Ok(_) => {}
                Err(e) => {
                    self.read_closed = true;
                    return Poll::Ready(Err(e));
                }
            }
        }
        // One chunk held back; wait for resume.
        self.read_waker = Some(cx.waker().clone());
        Poll::Pending
    }

    fn write(&mut self, chunk: Bytes) -> io::Result<bool> {
        if self.ending {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write after end",
            ));
        }
        self.outgoing.extend_from_slice(&chunk);
        Ok(self.outgoing.len() < self.soft_limit)
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
        if let Some(waker) = self.read_waker.take() {
            waker.wake();
        }
    }

    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while !self.outgoing.is_empty() {
            let n = ready!(Pin::new(&mut self.stream).poll_write(cx, &self.outgoing))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.outgoing.advance(n);
        }
        ready!(Pin::new(&mut self.stream).poll_flush(cx))?;

        if self.ending && !self.shutdown {
            ready!(Pin::new(&mut self.stream).poll_shutdown(cx))?;
            self.shutdown = true;
        }
        Poll::Ready(Ok(()))
    }

    fn end(&mut self) {
        self.ending = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::poll_fn;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    #[tokio::test]
    async fn test_write_reports_soft_limit() {
        let (stream, _peer) = duplex(1024);
        let mut ep = StreamEndpoint::with_limits(stream, "peer", 1024, 8);

        assert!(ep.write(Bytes::from_static(b"abcd")).unwrap());
        assert!(!ep.write(Bytes::from_static(b"efgh")).unwrap());
        assert_eq!(ep.buffered(), 8);
    }

    #[tokio::test]
    async fn test_oversized_chunk_is_buffered_whole() {
        let (stream, _peer) = duplex(1024);
        let mut ep = StreamEndpoint::with_limits(stream, "peer", 1024, 4);

        assert!(!ep.write(Bytes::from(vec![7u8; 100])).unwrap());
        assert_eq!(ep.buffered(), 100);
    }

    #[tokio::test]
    async fn test_drain_flushes_to_peer() {
        let (stream, mut peer) = duplex(1024);
        let mut ep = StreamEndpoint::new(stream, "peer");

        ep.write(Bytes::from_static(b"hello")).unwrap();
        poll_fn(|cx| ep.poll_drain(cx)).await.unwrap();
        assert_eq!(ep.buffered(), 0);

        let mut buf = [0u8; 16];
        let n = peer.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[tokio::test]
    async fn test_data_then_close() {
        let (stream, mut peer) = duplex(1024);
        let mut ep = StreamEndpoint::new(stream, "peer");

        peer.write_all(b"ping").await.unwrap();
        drop(peer);

        let chunk = poll_fn(|cx| ep.poll_data(cx)).await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"ping");
        assert!(poll_fn(|cx| ep.poll_data(cx)).await.is_none());
        // Stays closed.
        assert!(poll_fn(|cx| ep.poll_data(cx)).await.is_none());
    }

    #[tokio::test]
    async fn test_read_chunk_size_bounds_chunks() {
        let (stream, mut peer) = duplex(1024);
        let mut ep = StreamEndpoint::with_limits(stream, "peer", 3, 1024);

        peer.write_all(b"abcdefg").await.unwrap();
        let chunk = poll_fn(|cx| ep.poll_data(cx)).await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"abc");
        let chunk = poll_fn(|cx| ep.poll_data(cx)).await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"def");
    }

    #[tokio::test]
    async fn test_pause_suspends_reads_until_resume() {
        let (stream, mut peer) = duplex(1024);
        let mut ep = StreamEndpoint::new(stream, "peer");

        peer.write_all(b"queued").await.unwrap();
        ep.pause();
        assert!(ep.is_paused());

        let paused = tokio::time::timeout(
            Duration::from_millis(20),
            poll_fn(|cx| ep.poll_data(cx)),
        )
        .await;
        assert!(paused.is_err());

        ep.resume();
        let chunk = poll_fn(|cx| ep.poll_data(cx)).await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"queued");
    }

    #[tokio::test]
    async fn test_end_flushes_then_closes() {
        let (stream, mut peer) = duplex(1024);
        let mut ep = StreamEndpoint::new(stream, "peer");

        ep.write(Bytes::from_static(b"last words")).unwrap();
        ep.end();
        poll_fn(|cx| ep.poll_drain(cx)).await.unwrap();

        let mut received = Vec::new();
        peer.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"last words");

        assert_eq!(
            ep.write(Bytes::from_static(b"late")).unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }

    #[tokio::test]
    async fn test_close_is_seen_while_paused() {
        let (stream, mut peer) = duplex(1024);
        let mut ep = StreamEndpoint::new(stream, "peer");

        ep.pause();
        peer.write_all(b"tail").await.unwrap();
        drop(peer);

        poll_fn(|cx| ep.poll_closed(cx)).await.unwrap();

        // Data read ahead while paused is still delivered after resume.
        ep.resume();
        let chunk = poll_fn(|cx| ep.poll_data(cx)).await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"tail");
        assert!(poll_fn(|cx| ep.poll_data(cx)).await.is_none());
    }

    #[tokio::test]
    async fn test_paused_read_ahead_is_bounded_by_chunk_size() {
        let (stream, mut peer) = duplex(1024);
        let mut ep = StreamEndpoint::with_limits(stream, "peer", 4, 1024);

        ep.pause();
        peer.write_all(b"abcdefgh").await.unwrap();
        drop(peer);

        let watched = tokio::time::timeout(
            Duration::from_millis(20),
            poll_fn(|cx| ep.poll_closed(cx)),
        )
        .await;
        assert!(watched.is_err());

        ep.resume();
        let chunk = poll_fn(|cx| ep.poll_data(cx)).await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"abcd");
        let chunk = poll_fn(|cx| ep.poll_data(cx)).await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"efgh");
        assert!(poll_fn(|cx| ep.poll_data(cx)).await.is_none());
    }
}

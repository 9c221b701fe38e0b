//! Scripted endpoint for driving the relay deterministically.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use bytes::Bytes;
use parking_lot::Mutex;
use sockpipe_core::io::{DiagnosticSink, Endpoint};

/// Operation the relay invoked on an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Write(Vec<u8>),
    Pause,
    Resume,
    End,
}

enum Inbound {
    Data(Bytes),
    Close,
    Fail(io::ErrorKind),
}

#[derive(Default)]
struct State {
    inbound: VecDeque<Inbound>,
    closed: bool,
    paused: bool,
    read_waker: Option<Waker>,
    /// Results for upcoming writes; `false` means buffer-full. Default `true`.
    write_results: VecDeque<bool>,
    write_error: Option<io::ErrorKind>,
    /// Output still queued inside the endpoint.
    pending_output: bool,
    drain_waker: Option<Waker>,
    calls: Vec<Call>,
}

/// Endpoint half handed to the relay.
pub struct MockEndpoint {
    label: String,
    state: Arc<Mutex<State>>,
}

/// Test-side handle to the same endpoint.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<State>>,
}

pub fn mock(label: &str) -> (MockEndpoint, MockHandle) {
    let state = Arc::new(Mutex::new(State::default()));
    (
        MockEndpoint {
            label: label.to_string(),
            state: state.clone(),
        },
        MockHandle { state },
    )
}

impl MockHandle {
    fn push(&self, item: Inbound) {
        let mut s = self.state.lock();
        s.inbound.push_back(item);
        if let Some(w) = s.read_waker.take() {
            w.wake();
        }
    }

    /// Deliver a chunk as if it arrived from the wire.
    pub fn send(&self, data: &[u8]) {
        self.push(Inbound::Data(Bytes::copy_from_slice(data)));
    }

    /// Signal a graceful close after any queued chunks.
    pub fn close(&self) {
        self.push(Inbound::Close);
    }

    /// Signal a transport error after any queued chunks.
    pub fn fail(&self, kind: io::ErrorKind) {
        self.push(Inbound::Fail(kind));
    }

    /// Make the next write report buffer-full.
    pub fn fill_on_next_write(&self) {
        self.state.lock().write_results.push_back(false);
    }

    /// Make every following write fail.
    pub fn fail_writes(&self, kind: io::ErrorKind) {
        self.state.lock().write_error = Some(kind);
    }

    /// Pretend output is queued inside the endpoint's own stream.
    pub fn hold_output(&self) {
        self.state.lock().pending_output = true;
    }

    /// Flush the outgoing buffer and signal drain.
    pub fn drain(&self) {
        let mut s = self.state.lock();
        s.pending_output = false;
        if let Some(w) = s.drain_waker.take() {
            w.wake();
        }
    }

    pub fn written(&self) -> Vec<u8> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Write(b) => Some(b.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }
}

impl Endpoint for MockEndpoint {
    fn peer_label(&self) -> String {
        self.label.clone()
    }

    fn poll_data(&mut self, cx: &mut Context<'_>) -> Poll<Option<io::Result<Bytes>>> {
        let mut s = self.state.lock();
        if s.closed {
            return Poll::Ready(None);
        }
        if s.paused {
            s.read_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
        match s.inbound.pop_front() {
            Some(Inbound::Data(b)) => Poll::Ready(Some(Ok(b))),
            Some(Inbound::Close) => {
                s.closed = true;
                Poll::Ready(None)
            }
            Some(Inbound::Fail(kind)) => {
                s.closed = true;
                Poll::Ready(Some(Err(io::Error::new(kind, "mock transport failure"))))
            }
            None => {
                s.read_waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }

    fn poll_closed(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut s = self.state.lock();
        if s.closed {
            return Poll::Ready(Ok(()));
        }
        // Queued chunks stay put; only a close or failure behind them counts.
        let terminal = s
            .inbound
            .iter()
            .position(|item| !matches!(item, Inbound::Data(_)));
        match terminal.and_then(|i| s.inbound.remove(i)) {
            Some(Inbound::Fail(kind)) => {
                s.closed = true;
                Poll::Ready(Err(io::Error::new(kind, "mock transport failure")))
            }
            Some(_) => {
                s.closed = true;
                Poll::Ready(Ok(()))
            }
            None => {
                s.read_waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }

    fn write(&mut self, chunk: Bytes) -> io::Result<bool> {
        let mut s = self.state.lock();
        if let Some(kind) = s.write_error {
            return Err(io::Error::new(kind, "mock write failure"));
        }
        s.calls.push(Call::Write(chunk.to_vec()));
        let below_limit = s.write_results.pop_front().unwrap_or(true);
        if !below_limit {
            s.pending_output = true;
        }
        Ok(below_limit)
    }

    fn pause(&mut self) {
        let mut s = self.state.lock();
        s.paused = true;
        s.calls.push(Call::Pause);
    }

    fn resume(&mut self) {
        let mut s = self.state.lock();
        s.paused = false;
        s.calls.push(Call::Resume);
        if let Some(w) = s.read_waker.take() {
            w.wake();
        }
    }

    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut s = self.state.lock();
        if s.pending_output {
            s.drain_waker = Some(cx.waker().clone());
            Poll::Pending
        } else {
            Poll::Ready(Ok(()))
        }
    }

    fn end(&mut self) {
        self.state.lock().calls.push(Call::End);
    }
}

/// Sink collecting diagnostic lines.
#[derive(Default)]
pub struct LineCollector(Mutex<Vec<String>>);

impl LineCollector {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

impl DiagnosticSink for LineCollector {
    fn line(&self, line: &str) {
        self.0.lock().push(line.to_string());
    }
}

/// Let spawned tasks on the current-thread runtime run to quiescence.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

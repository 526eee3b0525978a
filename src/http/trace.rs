//! Per-request trace hooks and the timing breakdown derived from them

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Network phase latencies of a single request
///
/// A phase that never happened (no DNS for an IP literal, no TLS over
/// plain HTTP) is exactly zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    pub dns_lookup: Duration,
    pub tcp_connection: Duration,
    pub tls_handshake: Duration,
    pub server_processing: Duration,
    pub content_transfer: Duration,
}

impl Timings {
    pub fn total(&self) -> Duration {
        self.dns_lookup
            + self.tcp_connection
            + self.tls_handshake
            + self.server_processing
            + self.content_transfer
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Marks {
    dns_start: Option<Instant>,
    dns_done: Option<Instant>,
    connect_start: Option<Instant>,
    connect_done: Option<Instant>,
    tls_start: Option<Instant>,
    tls_done: Option<Instant>,
    wrote_request: Option<Instant>,
    first_response_byte: Option<Instant>,
    done: Option<Instant>,
}

/// Timestamp recorder shared between a request and its connection
///
/// One instance per request; clones share the same marks.
#[derive(Debug, Default, Clone)]
pub struct TraceHooks {
    marks: Arc<Mutex<Marks>>,
}

impl TraceHooks {
    pub fn new() -> Self {
        Self::default()
    }

    fn marks(&self) -> MutexGuard<'_, Marks> {
        self.marks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn dns_start(&self) {
        self.marks().dns_start = Some(Instant::now());
    }

    pub fn dns_done(&self) {
        self.marks().dns_done = Some(Instant::now());
    }

    pub fn connect_start(&self) {
        self.marks().connect_start = Some(Instant::now());
    }

    pub fn connect_done(&self) {
        self.marks().connect_done = Some(Instant::now());
    }

    pub fn tls_start(&self) {
        self.marks().tls_start = Some(Instant::now());
    }

    pub fn tls_done(&self) {
        self.marks().tls_done = Some(Instant::now());
    }

    /// Bytes of the request went out; the last write before the first
    /// response byte marks the request as fully written
    pub fn wrote_request(&self) {
        let mut marks = self.marks();
        if marks.first_response_byte.is_none() {
            marks.wrote_request = Some(Instant::now());
        }
    }

    pub fn first_response_byte(&self) {
        let mut marks = self.marks();
        if marks.first_response_byte.is_none() {
            marks.first_response_byte = Some(Instant::now());
        }
    }

    /// The response body has been read to the end
    pub fn done(&self) {
        self.marks().done = Some(Instant::now());
    }

    pub fn timings(&self) -> Timings {
        let marks = *self.marks();
        Timings {
            dns_lookup: phase(marks.dns_start, marks.dns_done),
            tcp_connection: phase(marks.connect_start, marks.connect_done),
            tls_handshake: phase(marks.tls_start, marks.tls_done),
            server_processing: phase(marks.wrote_request, marks.first_response_byte),
            content_transfer: phase(marks.first_response_byte, marks.done),
        }
    }
}

/// Elapsed time between two marks, zero unless both fired in order
fn phase(start: Option<Instant>, end: Option<Instant>) -> Duration {
    match (start, end) {
        (Some(start), Some(end)) => end.saturating_duration_since(start),
        _ => Duration::ZERO,
    }
}

/// Transport wrapper that reports write and first-read instants
pub struct TracedStream<S> {
    inner: S,
    hooks: TraceHooks,
}

impl<S> TracedStream<S> {
    pub fn new(inner: S, hooks: TraceHooks) -> Self {
        Self { inner, hooks }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TracedStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            if buf.filled().len() > before {
                this.hooks.first_response_byte();
            }
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TracedStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(written)) = poll {
            if written > 0 {
                this.hooks.wrote_request();
            }
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

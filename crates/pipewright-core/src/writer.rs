//! Response sinks.
//!
//! Handlers and steps never see a concrete response type; they write to a
//! [`ResponseWriter`]. A chain may substitute the sink before inner layers
//! run, most notably with a [`BufferingWriter`] that mirrors every written
//! byte into memory so later steps can inspect the body.
//!
//! ## Capability Narrowing
//!
//! Whether a sink supports read-back is discovered at runtime with
//! [`ResponseWriter::as_buffered`]. Steps that need the body go through
//! [`expect_buffered_writer`], which turns an unsupported sink into
//! [`ChainError::Unbuffered`] instead of guessing.
//!
//! ```
//! use pipewright_core::{expect_buffered_writer, BufferingWriter, ResponseRecorder, ResponseWriter};
//!
//! let mut recorder = ResponseRecorder::new();
//! assert!(expect_buffered_writer(&mut recorder).is_err());
//!
//! let mut buffering = BufferingWriter::new(&mut recorder);
//! buffering.write(b"hello").unwrap();
//!
//! let buffered = expect_buffered_writer(&mut buffering).unwrap();
//! assert_eq!(buffered.buffer(), b"hello");
//! ```

use crate::error::{ChainError, ChainResult};
use crate::types::Response;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use std::io;

/// A sink that a response is written to.
///
/// Exactly one component writes to a sink at a time; chains run their steps
/// sequentially, so implementations need no internal synchronization.
pub trait ResponseWriter {
    /// Returns the response headers for mutation.
    ///
    /// Headers changed after the first body write may be ignored by sinks
    /// that stream the response.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sets the response status line.
    fn write_status(&mut self, status: StatusCode);

    /// Sets the status line even if one was already written.
    ///
    /// Used to mark a failed response. Sinks that have already sent the
    /// status line cannot take it back and keep the default, which behaves
    /// like [`write_status`](Self::write_status).
    fn override_status(&mut self, status: StatusCode) {
        self.write_status(status);
    }

    /// Writes body bytes, returning how many bytes the sink accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Returns this sink narrowed to [`BufferedWriter`], if it supports read-back.
    fn as_buffered(&mut self) -> Option<&mut dyn BufferedWriter> {
        None
    }
}

/// A sink that also exposes every byte written through it so far.
pub trait BufferedWriter: ResponseWriter {
    /// Returns the accumulated body bytes.
    fn buffer(&self) -> &[u8];
}

/// Narrows `writer` to its buffered capability.
///
/// # Errors
///
/// Returns [`ChainError::Unbuffered`] if the sink does not support read-back.
pub fn expect_buffered_writer(writer: &mut dyn ResponseWriter) -> ChainResult<&mut dyn BufferedWriter> {
    writer.as_buffered().ok_or(ChainError::Unbuffered)
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for &mut W {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        (**self).write_status(status);
    }

    fn override_status(&mut self, status: StatusCode) {
        (**self).override_status(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn as_buffered(&mut self) -> Option<&mut dyn BufferedWriter> {
        (**self).as_buffered()
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for Box<W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        (**self).write_status(status);
    }

    fn override_status(&mut self, status: StatusCode) {
        (**self).override_status(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn as_buffered(&mut self) -> Option<&mut dyn BufferedWriter> {
        (**self).as_buffered()
    }
}

/// A sink adapter that mirrors every write into an in-memory buffer.
///
/// Writes are appended to the buffer and then forwarded unchanged to the
/// wrapped sink, whose result is returned as-is. Headers and status pass
/// straight through. The buffer only grows and lives as long as the adapter.
#[derive(Debug)]
pub struct BufferingWriter<W> {
    inner: W,
    buffer: BytesMut,
}

impl<W: ResponseWriter> BufferingWriter<W> {
    /// Wraps `inner` with an empty buffer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
        }
    }

    /// Returns the wrapped sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consumes the adapter, returning the wrapped sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Consumes the adapter, returning the accumulated bytes.
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }
}

impl<W: ResponseWriter> ResponseWriter for BufferingWriter<W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        self.inner.write_status(status);
    }

    fn override_status(&mut self, status: StatusCode) {
        self.inner.override_status(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.buffer.capacity() == 0 {
            self.buffer.reserve(buf.len());
        }
        self.buffer.extend_from_slice(buf);
        self.inner.write(buf)
    }

    fn as_buffered(&mut self) -> Option<&mut dyn BufferedWriter> {
        Some(self)
    }
}

impl<W: ResponseWriter> BufferedWriter for BufferingWriter<W> {
    fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

/// An in-memory sink that records a complete response.
///
/// The first status written wins; writing body bytes before any status
/// implies `200 OK`. [`ResponseWriter::override_status`] replaces whatever
/// was recorded.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded status, `200 OK` if none was written.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Returns the recorded headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the recorded body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Converts the recording into a [`Response`].
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        match self.status {
            Some(existing) => {
                tracing::debug!(
                    existing = existing.as_u16(),
                    ignored = status.as_u16(),
                    "superfluous status write"
                );
            }
            None => self.status = Some(status),
        }
    }

    fn override_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

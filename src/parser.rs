//! The parser facade: owns the buffer, source, current request's
//! headers, body-read mode, byte counters and completion flag, reused
//! across requests on one keep-alive connection.

use std::io;

use log::{debug, trace};

use crate::body::{self, BodyMode};
use crate::buffer::RingBuffer;
use crate::header;
use crate::headers::{self, Headers};
use crate::limits::Limits;
use crate::request_line;
use crate::source::ByteSource;

/// A reusable, single-connection HTTP/1.x request parser.
///
/// One `Parser` is bound to one peer connection and is driven through
/// repeated `parse_headers` / body-read / `is_complete` cycles across
/// that connection's keep-alive lifetime. It is not `Sync`-safe to
/// share across threads, like the byte source it wraps: it is meant
/// for a single owning task.
///
/// Unlike the duck-typed source language this parser's design is
/// modeled on, Rust's ownership rules make "the caller holds the
/// headers map and passes it back into each body-read call" awkward:
/// the map would need to be threaded through unchanged while the
/// parser's own cursor and body-framing state evolve independently.
/// Instead the parser keeps the current request's [`Headers`]
/// internally (mutating `:rx` on it directly, exactly as the original
/// single-owner design does) and hands the caller a clone from
/// `parse_headers`; [`Parser::headers`] fetches the live, `:rx`-current
/// copy back out at any point, which callers should prefer over their
/// earlier clone once they start reading the body.
pub struct Parser<S> {
    source: S,
    buffer: RingBuffer,
    limits: Limits,
    headers: Option<Headers>,
    body_mode: BodyMode,
    body_left: u64,
    current_request_rx: u64,
    request_completed: bool,
    total_bytes_received: u64,
}

impl<S: ByteSource> Parser<S> {
    /// Binds a parser to `source` with the default [`Limits`].
    pub fn new(source: S) -> Self {
        Self::with_limits(source, Limits::default())
    }

    /// Binds a parser to `source` with caller-supplied `limits`.
    pub fn with_limits(source: S, limits: Limits) -> Self {
        trace!("parser bound to source, buffer reserved at {} bytes", limits.initial_buffer_size);
        Self {
            source,
            buffer: RingBuffer::with_capacity(limits.initial_buffer_size),
            limits,
            headers: None,
            body_mode: BodyMode::Unknown,
            body_left: 0,
            current_request_rx: 0,
            request_completed: false,
            total_bytes_received: 0,
        }
    }

    /// Bytes received from the source across this connection's entire
    /// lifetime, never reset between requests. Supplements the
    /// per-request `:rx` accounting with a connection-lifetime total.
    #[must_use]
    pub fn total_bytes_received(&self) -> u64 {
        self.total_bytes_received
    }

    /// The current request's headers, with an up-to-date `:rx`. `None`
    /// before the first successful `parse_headers`, or once a clean
    /// EOF has been observed at a request boundary.
    #[must_use]
    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    /// Parses one request's start-line and header block.
    ///
    /// Returns `Ok(None)` on a clean EOF with no byte of a new request
    /// line consumed yet (the caller should close the connection
    /// without treating this as an error). Any EOF after that point, or
    /// any syntactic/limit violation, is an `Err`.
    pub fn parse_headers(&mut self) -> io::Result<Option<Headers>> {
        self.buffer
            .trim(self.limits.buffer_trim_min_len, self.limits.buffer_trim_min_pos);

        self.headers = None;
        self.body_mode = BodyMode::Unknown;
        self.body_left = 0;
        self.current_request_rx = 0;
        self.request_completed = false;

        if self
            .buffer
            .peek_fill(&mut self.source, self.limits.max_headers_read_length)?
            .is_none()
        {
            return Ok(None);
        }

        let start_consumed = self.buffer.total_consumed();

        let request_line = request_line::parse(&mut self.buffer, &mut self.source, &self.limits)
            .inspect_err(|e| log::warn!("rejecting request line: {e}"))?;

        let mut headers = Headers::new();
        headers.set_unique(headers::PSEUDO_METHOD, request_line.method);
        headers.set_unique(headers::PSEUDO_PATH, request_line.path);
        headers.set_unique(headers::PSEUDO_PROTOCOL, request_line.protocol);

        header::parse(&mut self.buffer, &mut self.source, &self.limits, &mut headers)
            .inspect_err(|e| log::warn!("rejecting header block: {e}"))?;

        let rx = self.buffer.total_consumed() - start_consumed;
        self.current_request_rx = rx;
        self.total_bytes_received += rx;
        headers.set_rx(self.current_request_rx);

        self.headers = Some(headers.clone());
        Ok(Some(headers))
    }

    /// Selects the body-framing mode on first access, from the stored
    /// request's headers.
    fn ensure_body_mode(&mut self) -> io::Result<()> {
        if self.body_mode != BodyMode::Unknown {
            return Ok(());
        }
        let headers = self.headers.as_ref().expect(
            "body reads must follow a successful parse_headers call for this request",
        );
        let (mode, complete) = body::detect(headers).map_err(io::Error::from)?;
        debug!("body mode detected: {mode:?}");
        self.body_mode = mode;
        self.request_completed = complete;
        if let BodyMode::ContentLength(n) = mode {
            self.body_left = n;
        }
        Ok(())
    }

    fn record_rx(&mut self, delta: u64) {
        self.current_request_rx += delta;
        self.total_bytes_received += delta;
        if let Some(headers) = self.headers.as_mut() {
            headers.set_rx(self.current_request_rx);
        }
    }

    /// Drains the entire body per the selected framing. `Ok(None)` if
    /// the request has no body.
    pub fn read_body(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.ensure_body_mode()?;
        let start = self.buffer.total_consumed();
        let result = match self.body_mode {
            BodyMode::None => None,
            BodyMode::ContentLength(_) => {
                let bytes = body::read_content_length_all(
                    &mut self.buffer,
                    &mut self.source,
                    &self.limits,
                    &mut self.body_left,
                )?;
                self.request_completed = true;
                Some(bytes)
            }
            BodyMode::Chunked => {
                let bytes =
                    body::read_chunked_all(&mut self.buffer, &mut self.source, &self.limits)?;
                self.request_completed = true;
                Some(bytes)
            }
            BodyMode::Unknown => unreachable!("ensure_body_mode always resolves Unknown"),
        };
        let delta = self.buffer.total_consumed() - start;
        self.record_rx(delta);
        Ok(result)
    }

    /// Returns the next available body bytes without necessarily
    /// draining the whole body. `Ok(None)` only when the request has no
    /// body at all; an empty `Vec` means "nothing new yet" and the
    /// caller should poll [`Parser::is_complete`] before retrying.
    ///
    /// `buffered_only`, when true, never calls the source: it returns
    /// only bytes already sitting in the shared buffer (content-length
    /// mode honors this literally; chunked mode always has to inspect
    /// the next chunk-size line, which may require a source read, so
    /// the buffered-only nuance only really bites in content-length
    /// mode).
    pub fn read_body_chunk(&mut self, buffered_only: bool) -> io::Result<Option<Vec<u8>>> {
        self.ensure_body_mode()?;
        let start = self.buffer.total_consumed();
        let result = match self.body_mode {
            BodyMode::None => None,
            BodyMode::ContentLength(_) => {
                let bytes = body::read_content_length_chunk(
                    &mut self.buffer,
                    &mut self.source,
                    &self.limits,
                    &mut self.body_left,
                    buffered_only,
                )?;
                if self.body_left == 0 {
                    self.request_completed = true;
                }
                Some(bytes)
            }
            BodyMode::Chunked => {
                match body::read_chunk(&mut self.buffer, &mut self.source, &self.limits)? {
                    Some(bytes) => Some(bytes),
                    None => {
                        self.request_completed = true;
                        Some(Vec::new())
                    }
                }
            }
            BodyMode::Unknown => unreachable!("ensure_body_mode always resolves Unknown"),
        };
        let delta = self.buffer.total_consumed() - start;
        self.record_rx(delta);
        Ok(result)
    }

    /// `true` iff no more bytes are expected for the current request.
    /// Triggers body-mode detection on first call, same as the body
    /// readers.
    pub fn is_complete(&mut self) -> io::Result<bool> {
        self.ensure_body_mode()?;
        Ok(self.request_completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A byte source that replays a fixed string split at caller-chosen
    /// boundaries, exercising chunking-independence.
    struct ChunkedSource {
        remaining: std::collections::VecDeque<Vec<u8>>,
    }

    impl ChunkedSource {
        fn new(chunks: Vec<&[u8]>) -> Self {
            Self {
                remaining: chunks.into_iter().map(<[u8]>::to_vec).collect(),
            }
        }
    }

    impl crate::source::ByteSource for ChunkedSource {
        fn fill(&mut self, dst: &mut bytes::BytesMut, max_len: usize) -> io::Result<usize> {
            let Some(mut next) = self.remaining.pop_front() else {
                return Ok(0);
            };
            if next.len() > max_len {
                let rest = next.split_off(max_len);
                self.remaining.push_front(rest);
            }
            let n = next.len();
            dst.extend_from_slice(&next);
            Ok(n)
        }
    }

    #[test]
    fn minimal_request_with_no_body() {
        let src = ChunkedSource::new(vec![b"GET / HTTP/1.1\r\nHost: x\r\n\r\n"]);
        let mut parser = Parser::new(src);
        let headers = parser.parse_headers().unwrap().unwrap();
        assert_eq!(headers.method(), Some(b"get".as_slice()));
        assert_eq!(headers.path(), Some(b"/".as_slice()));
        assert_eq!(headers.protocol(), Some(b"http/1.1".as_slice()));
        assert_eq!(headers.get(b"host").unwrap().first(), b"x");
        assert_eq!(headers.rx(), 27);

        assert_eq!(parser.read_body().unwrap(), None);
        assert!(parser.is_complete().unwrap());
    }

    #[test]
    fn content_length_body_arrives_split_across_many_reads() {
        let request = b"GET / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        for split in 1..request.len() {
            let (head, tail) = request.split_at(split);
            let src = ChunkedSource::new(vec![head, tail]);
            let mut parser = Parser::new(src);
            parser.parse_headers().unwrap().unwrap();
            let body = parser.read_body().unwrap().unwrap();
            assert_eq!(body, b"hello", "split at {split} produced wrong body");
            assert!(parser.is_complete().unwrap());
        }
    }

    #[test]
    fn chunked_body_streams_one_chunk_per_call() {
        let src = ChunkedSource::new(vec![
            b"GET / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n",
            b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
        ]);
        let mut parser = Parser::new(src);
        parser.parse_headers().unwrap().unwrap();

        let first = parser.read_body_chunk(false).unwrap().unwrap();
        assert_eq!(first, b"hello");
        assert!(!parser.is_complete().unwrap());

        let second = parser.read_body_chunk(false).unwrap().unwrap();
        assert_eq!(second, b" world");
        assert!(!parser.is_complete().unwrap());

        let third = parser.read_body_chunk(false).unwrap().unwrap();
        assert_eq!(third, Vec::<u8>::new());
        assert!(parser.is_complete().unwrap());
    }

    #[test]
    fn keep_alive_resets_per_request_state_between_requests() {
        let src = ChunkedSource::new(vec![
            b"GET /one HTTP/1.1\r\nHost: a\r\n\r\nGET /two HTTP/1.1\r\nHost: b\r\n\r\n",
        ]);
        let mut parser = Parser::new(src);

        let first = parser.parse_headers().unwrap().unwrap();
        assert_eq!(first.path(), Some(b"/one".as_slice()));
        assert!(parser.read_body().unwrap().is_none());
        assert!(parser.is_complete().unwrap());

        let second = parser.parse_headers().unwrap().unwrap();
        assert_eq!(second.path(), Some(b"/two".as_slice()));
        assert!(second.rx() > 0);
        assert!(parser.read_body().unwrap().is_none());
        assert!(parser.is_complete().unwrap());
    }

    #[test]
    fn http_1_0_request_with_no_body_completes_immediately() {
        let src = ChunkedSource::new(vec![b"GET / HTTP/1.0\r\n\r\n"]);
        let mut parser = Parser::new(src);
        let headers = parser.parse_headers().unwrap().unwrap();
        assert_eq!(headers.protocol(), Some(b"http/1.0".as_slice()));
        assert!(parser.is_complete().unwrap());
    }

    #[test]
    fn clean_eof_before_any_byte_returns_none() {
        let src = ChunkedSource::new(vec![]);
        let mut parser = Parser::new(src);
        assert!(parser.parse_headers().unwrap().is_none());
    }

    #[test]
    fn eof_mid_request_line_is_an_error_not_none() {
        let src = ChunkedSource::new(vec![b"GET / HTTP"]);
        let mut parser = Parser::new(src);
        let err = parser.parse_headers().unwrap_err();
        assert_eq!(
            err.to_string(),
            crate::error::ParseError::IncompleteRequestBody.phrase()
        );
    }
}

//! Body framing: content-length and chunked strategies, selected from
//! the parsed headers on first body access.

use std::io;

use crate::buffer::RingBuffer;
use crate::error::ParseError;
use crate::headers::Headers;
use crate::limits::Limits;
use crate::source::ByteSource;

/// Which body-framing strategy applies to the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// Detection has not run yet for this request.
    Unknown,
    /// The request carries no body at all.
    None,
    /// `content-length: n`, with `n` bytes still left to drain.
    ContentLength(u64),
    /// `transfer-encoding: chunked`.
    Chunked,
}

/// Inspects `headers` and selects a [`BodyMode`]. Returns the mode plus
/// whether the request is already complete (no body, or a declared
/// zero-length body).
pub fn detect(headers: &Headers) -> Result<(BodyMode, bool), ParseError> {
    if let Some(value) = headers.get(b"content-length") {
        let n = parse_content_length(value.first())?;
        let complete = n == 0;
        return Ok((BodyMode::ContentLength(n), complete));
    }
    if let Some(value) = headers.get(b"transfer-encoding") {
        if value.first().eq_ignore_ascii_case(b"chunked") {
            return Ok((BodyMode::Chunked, false));
        }
    }
    Ok((BodyMode::None, true))
}

fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    if value.is_empty() {
        return Err(ParseError::InvalidContentLength);
    }
    let mut n: u64 = 0;
    for &b in value {
        if !b.is_ascii_digit() {
            return Err(ParseError::InvalidContentLength);
        }
        n = n
            .checked_mul(10)
            .and_then(|n| n.checked_add(u64::from(b - b'0')))
            .ok_or(ParseError::InvalidBodyContentLength)?;
    }
    Ok(n)
}

/// Drains exactly `want` bytes: buffer-first, then looping source reads
/// capped at `limits.max_body_read_length` per call. A source read that
/// returns `0` while bytes are still wanted is `IncompleteBody`.
fn drain_exact<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
    want: u64,
) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(want.min(limits.max_body_read_length as u64) as usize);
    let mut remaining = want;
    while remaining > 0 {
        let avail = buf.remaining().min(remaining as usize);
        if avail > 0 {
            out.extend_from_slice(&buf.take(avail));
            remaining -= avail as u64;
            continue;
        }
        let want_now = remaining.min(limits.max_body_read_length as u64) as usize;
        if buf.fill(source, want_now)? == 0 {
            return Err(ParseError::IncompleteBody.into());
        }
    }
    Ok(out)
}

/// Content-length mode, "read entire body": drains `body_left` bytes in
/// full, looping source reads as needed.
pub fn read_content_length_all<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
    body_left: &mut u64,
) -> io::Result<Vec<u8>> {
    let bytes = drain_exact(buf, source, limits, *body_left)?;
    *body_left = 0;
    Ok(bytes)
}

/// Content-length mode, "read next available chunk": buffer-first, then
/// at most one source call (skipped entirely when `buffered_only` and
/// nothing was already buffered). Partial returns are expected; an
/// empty `Vec` means "nothing new yet", not "no body" (callers poll
/// `Parser::is_complete` to know when to stop).
pub fn read_content_length_chunk<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
    body_left: &mut u64,
    buffered_only: bool,
) -> io::Result<Vec<u8>> {
    if *body_left == 0 {
        return Ok(Vec::new());
    }

    let avail = buf.remaining().min(*body_left as usize);
    if avail > 0 {
        let bytes = buf.take(avail);
        *body_left -= avail as u64;
        return Ok(bytes);
    }

    if buffered_only {
        return Ok(Vec::new());
    }

    let want = (*body_left).min(limits.max_body_read_length as u64) as usize;
    let got = buf.fill(source, want)?;
    if got == 0 {
        return Err(ParseError::IncompleteBody.into());
    }
    let take_n = (got as u64).min(*body_left) as usize;
    let bytes = buf.take(take_n);
    *body_left -= take_n as u64;
    Ok(bytes)
}

fn hex_digit_value(b: u8) -> Option<u32> {
    match b {
        b'0'..=b'9' => Some(u32::from(b - b'0')),
        b'a'..=b'f' => Some(u32::from(b - b'a') + 10),
        b'A'..=b'F' => Some(u32::from(b - b'A') + 10),
        _ => None,
    }
}

/// Consumes a CRLF or bare-LF terminator at the cursor.
fn expect_terminator<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
    on_missing: ParseError,
) -> io::Result<()> {
    let Some(b) = buf.peek_fill(source, limits.max_body_read_length)? else {
        return Err(on_missing.into());
    };
    match b {
        b'\n' => {
            buf.advance(1);
            Ok(())
        }
        b'\r' => {
            if !buf.ensure(source, 2, limits.max_body_read_length)? {
                return Err(on_missing.into());
            }
            if buf.peek(1) != Some(b'\n') {
                return Err(on_missing.into());
            }
            buf.advance(2);
            Ok(())
        }
        _ => Err(on_missing.into()),
    }
}

/// Reads one hex chunk-size line. An empty size (bare terminator with
/// no digits) is a rejection.
fn read_chunk_size<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
) -> io::Result<u64> {
    let mut digits = 0usize;
    let mut value: u64 = 0;
    loop {
        let Some(b) = buf.peek_fill(source, limits.max_body_read_length)? else {
            return Err(ParseError::IncompleteBody.into());
        };
        let Some(d) = hex_digit_value(b) else { break };
        digits += 1;
        if digits > limits.max_chunk_size_digits {
            return Err(ParseError::InvalidChunkSize.into());
        }
        value = value
            .checked_mul(16)
            .and_then(|v| v.checked_add(u64::from(d)))
            .ok_or(ParseError::InvalidChunkSize)?;
        buf.advance(1);
    }
    if digits == 0 {
        return Err(ParseError::InvalidChunkSize.into());
    }
    expect_terminator(buf, source, limits, ParseError::InvalidChunkSize)?;
    Ok(value)
}

/// Processes the next chunk: reads its size line, drains its payload
/// (if any) and the trailing terminator. Returns `None` when the
/// zero-size chunk was reached. Trailers are not parsed; a strict
/// terminator CRLF/LF is required right after the zero-size line.
pub fn read_chunk<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
) -> io::Result<Option<Vec<u8>>> {
    let size = read_chunk_size(buf, source, limits)?;
    if size == 0 {
        expect_terminator(buf, source, limits, ParseError::MalformedRequestBody)?;
        return Ok(None);
    }
    let payload = drain_exact(buf, source, limits, size)?;
    expect_terminator(buf, source, limits, ParseError::MalformedRequestBody)?;
    Ok(Some(payload))
}

/// Chunked mode, "read entire body": loops `read_chunk` to the
/// terminating zero-chunk and concatenates the payloads.
pub fn read_chunked_all<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(chunk) = read_chunk(buf, source, limits)? {
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}

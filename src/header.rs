//! Header-block tokenizer.
//!
//! Repeats `key ":" SP* value CRLF` until an empty line (zero-length
//! key) terminates the block. Keys are lowercased on store; values are
//! kept verbatim. A repeated key promotes its stored value from
//! [`crate::headers::HeaderValue::Single`] to `Multi`.

use std::io;

use crate::buffer::RingBuffer;
use crate::error::ParseError;
use crate::headers::Headers;
use crate::limits::Limits;
use crate::source::ByteSource;

/// Parses header lines into `headers` until the terminating empty
/// line. The caller must already have ensured at least one byte is
/// buffered (the byte following the request line's terminator).
pub fn parse<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
    headers: &mut Headers,
) -> io::Result<()> {
    let mut count = 0usize;

    loop {
        let Some(first) = buf.peek_fill(source, limits.max_headers_read_length)? else {
            return Err(ParseError::IncompleteRequestBody.into());
        };

        // Zero-length key: end of the header block. The terminator
        // bytes are consumed but no further fill is attempted, since
        // the next byte may be the first byte of the body, which might
        // not have arrived yet.
        if first == b'\n' {
            buf.advance(1);
            return Ok(());
        }
        if first == b'\r' {
            if !buf.ensure(source, 2, limits.max_headers_read_length)? {
                return Err(ParseError::IncompleteRequestBody.into());
            }
            if buf.peek(1) != Some(b'\n') {
                return Err(ParseError::InvalidHeaderKey.into());
            }
            buf.advance(2);
            return Ok(());
        }

        count += 1;
        if count > limits.max_header_count {
            return Err(ParseError::TooManyHeaders.into());
        }

        let key = read_key(buf, source, limits)?;
        let value = read_value(buf, source, limits)?;
        headers.push_header(
            key.to_ascii_lowercase().into_boxed_slice(),
            value.into_boxed_slice(),
        );
    }
}

/// Reads a header key, already positioned at its first byte. Rejects a
/// space anywhere in the key (space-before-colon) and CR/LF appearing
/// before the terminating colon.
fn read_key<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut chars = 0usize;
    loop {
        let Some(ch) = buf.take_char(source, limits.max_headers_read_length)? else {
            return Err(ParseError::IncompleteRequestBody.into());
        };
        if ch.len() == 1 {
            match ch[0] {
                b':' => {
                    if out.is_empty() {
                        return Err(ParseError::InvalidHeaderKey.into());
                    }
                    return Ok(out);
                }
                b' ' | b'\r' | b'\n' => return Err(ParseError::InvalidHeaderKey.into()),
                _ => {}
            }
        }
        chars += 1;
        if chars > limits.max_header_key_length {
            return Err(ParseError::InvalidHeaderKey.into());
        }
        out.extend_from_slice(&ch);
    }
}

/// Reads a header value: leading spaces skipped, terminated by CRLF or
/// a bare LF, stored verbatim.
fn read_value<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
) -> io::Result<Vec<u8>> {
    loop {
        match buf.peek_fill(source, limits.max_headers_read_length)? {
            Some(b' ') => buf.advance(1),
            _ => break,
        }
    }

    let mut out = Vec::new();
    let mut chars = 0usize;
    loop {
        let Some(ch) = buf.take_char(source, limits.max_headers_read_length)? else {
            return Err(ParseError::IncompleteRequestBody.into());
        };
        if ch.len() == 1 {
            match ch[0] {
                b'\n' => {
                    if out.is_empty() {
                        return Err(ParseError::InvalidHeaderValue.into());
                    }
                    return Ok(out);
                }
                b'\r' => {
                    if out.is_empty() {
                        return Err(ParseError::InvalidHeaderValue.into());
                    }
                    if buf.peek_fill(source, limits.max_headers_read_length)? != Some(b'\n') {
                        return Err(ParseError::InvalidHeaderValue.into());
                    }
                    buf.advance(1);
                    return Ok(out);
                }
                _ => {}
            }
        }
        chars += 1;
        if chars > limits.max_header_value_length {
            return Err(ParseError::InvalidHeaderValue.into());
        }
        out.extend_from_slice(&ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(s: &[u8]) -> io::Result<Headers> {
        let mut buf = RingBuffer::with_capacity(64);
        let mut src: &[u8] = s;
        buf.fill(&mut src, s.len()).unwrap();
        let mut headers = Headers::new();
        parse(&mut buf, &mut src, &Limits::default(), &mut headers)?;
        Ok(headers)
    }

    #[test]
    fn parses_a_single_header_and_lowercases_the_key() {
        let headers = parse_str(b"Host: example.com\r\n\r\n").unwrap();
        assert_eq!(headers.get(b"host").unwrap().first(), b"example.com");
    }

    #[test]
    fn empty_block_terminates_immediately() {
        let headers = parse_str(b"\r\n").unwrap();
        assert_eq!(headers.len(), 0);
    }

    #[test]
    fn bare_lf_terminators_are_accepted_everywhere() {
        let headers = parse_str(b"Host: x\nAccept: y\n\n").unwrap();
        assert_eq!(headers.get(b"host").unwrap().first(), b"x");
        assert_eq!(headers.get(b"accept").unwrap().first(), b"y");
    }

    #[test]
    fn repeated_header_is_promoted_to_a_sequence() {
        let headers = parse_str(b"X-A: 1\r\nX-A: 2\r\n\r\n").unwrap();
        let values: Vec<&[u8]> = headers.get(b"x-a").unwrap().values().collect();
        assert_eq!(values, vec![b"1".as_slice(), b"2".as_slice()]);
    }

    #[test]
    fn space_before_colon_is_rejected() {
        let err = parse_str(b"Host : x\r\n\r\n").unwrap_err();
        assert_eq!(err.to_string(), ParseError::InvalidHeaderKey.phrase());
    }

    #[test]
    fn key_at_boundary_length_is_accepted() {
        let key = "k".repeat(128);
        let line = format!("{key}: v\r\n\r\n");
        let headers = parse_str(line.as_bytes()).unwrap();
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn key_over_length_is_rejected() {
        let key = "k".repeat(129);
        let line = format!("{key}: v\r\n\r\n");
        let err = parse_str(line.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), ParseError::InvalidHeaderKey.phrase());
    }

    #[test]
    fn header_count_at_boundary_is_accepted_and_over_is_rejected() {
        let mut at_limit = String::new();
        for i in 0..128 {
            at_limit.push_str(&format!("X-{i}: v\r\n"));
        }
        at_limit.push_str("\r\n");
        let headers = parse_str(at_limit.as_bytes()).unwrap();
        assert_eq!(headers.len(), 128);

        let mut over_limit = String::new();
        for i in 0..129 {
            over_limit.push_str(&format!("X-{i}: v\r\n"));
        }
        over_limit.push_str("\r\n");
        let err = parse_str(over_limit.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), ParseError::TooManyHeaders.phrase());
    }
}

//! Request-line tokenizer.
//!
//! Grammar: `method SP request-target SP protocol CRLF` (a bare LF is
//! also accepted as the protocol's line terminator). Lengths are
//! counted in UTF-8 characters, not bytes; rejecting on overrun is
//! mandatory, never a silent truncation.

use std::io;

use crate::buffer::RingBuffer;
use crate::error::ParseError;
use crate::limits::Limits;
use crate::source::ByteSource;

pub struct RequestLine {
    pub method: Vec<u8>,
    pub path: Vec<u8>,
    pub protocol: Vec<u8>,
}

/// Parses one request line. The caller must already have ensured at
/// least one byte is buffered (so a clean EOF at a request boundary can
/// be told apart from an EOF mid-request-line, which is what this
/// function always treats as [`ParseError::IncompleteRequestBody`]).
pub fn parse<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    limits: &Limits,
) -> io::Result<RequestLine> {
    let method = read_token(
        buf,
        source,
        limits.max_headers_read_length,
        limits.max_method_length,
        false,
        ParseError::InvalidMethod,
    )?;
    if method.is_empty() {
        return Err(ParseError::InvalidMethod.into());
    }

    let path = read_token(
        buf,
        source,
        limits.max_headers_read_length,
        limits.max_path_length,
        true,
        ParseError::InvalidRequestTarget,
    )?;
    if path.is_empty() {
        return Err(ParseError::InvalidRequestTarget.into());
    }

    let protocol = read_protocol(buf, source, limits.max_headers_read_length)?;

    Ok(RequestLine {
        method: method.to_ascii_lowercase(),
        path,
        protocol: protocol.to_ascii_lowercase(),
    })
}

/// Reads a SP-terminated token, counting UTF-8 characters against
/// `max_chars`. CR/LF anywhere inside the token is a rejection. When
/// `skip_leading_spaces` is set, leading SPs are consumed first (used
/// for the request-target, which may follow extra separating spaces).
fn read_token<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    max_read_len: usize,
    max_chars: usize,
    skip_leading_spaces: bool,
    on_error: ParseError,
) -> io::Result<Vec<u8>> {
    if skip_leading_spaces {
        loop {
            match buf.peek_fill(source, max_read_len)? {
                Some(b' ') => buf.advance(1),
                _ => break,
            }
        }
    }

    let mut out = Vec::new();
    let mut chars = 0usize;
    loop {
        let Some(ch) = buf.take_char(source, max_read_len)? else {
            return Err(ParseError::IncompleteRequestBody.into());
        };
        if ch.len() == 1 {
            match ch[0] {
                b' ' => {
                    if out.is_empty() {
                        return Err(on_error.into());
                    }
                    return Ok(out);
                }
                b'\r' | b'\n' => return Err(on_error.into()),
                _ => {}
            }
        }
        chars += 1;
        if chars > max_chars {
            return Err(on_error.into());
        }
        out.extend_from_slice(&ch);
    }
}

/// Reads the protocol token: `HTTP/1` case-insensitively, optionally
/// followed by `.0` or `.1`, terminated by CRLF or a bare LF. Leading
/// spaces are skipped (a request-target may be followed by more than
/// one separating space in lenient peers). The protocol token itself is
/// always pure ASCII, so this works byte-at-a-time rather than through
/// the UTF-8-aware character reader.
fn read_protocol<S: ByteSource>(
    buf: &mut RingBuffer,
    source: &mut S,
    max_read_len: usize,
) -> io::Result<Vec<u8>> {
    loop {
        match buf.peek_fill(source, max_read_len)? {
            Some(b' ') => buf.advance(1),
            _ => break,
        }
    }

    if !buf.ensure(source, 6, max_read_len)? {
        return Err(ParseError::IncompleteRequestBody.into());
    }
    let prefix = buf.unread()[..6].to_vec();
    if !prefix.eq_ignore_ascii_case(b"http/1") {
        return Err(ParseError::InvalidProtocol.into());
    }
    buf.advance(6);
    let mut protocol = prefix;

    if let Some(b'.') = buf.peek_fill(source, max_read_len)? {
        if !buf.ensure(source, 2, max_read_len)? {
            return Err(ParseError::IncompleteRequestBody.into());
        }
        let minor = buf.peek(1).unwrap();
        if minor != b'0' && minor != b'1' {
            return Err(ParseError::InvalidProtocol.into());
        }
        protocol.push(b'.');
        protocol.push(minor);
        buf.advance(2);
    }

    // Terminator: CRLF or a bare LF.
    let Some(term) = buf.peek_fill(source, max_read_len)? else {
        return Err(ParseError::IncompleteRequestBody.into());
    };
    match term {
        b'\n' => buf.advance(1),
        b'\r' => {
            if !buf.ensure(source, 2, max_read_len)? {
                return Err(ParseError::IncompleteRequestBody.into());
            }
            if buf.peek(1) != Some(b'\n') {
                return Err(ParseError::InvalidProtocol.into());
            }
            buf.advance(2);
        }
        _ => return Err(ParseError::InvalidProtocol.into()),
    }

    Ok(protocol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(s: &[u8]) -> io::Result<RequestLine> {
        let mut buf = RingBuffer::with_capacity(64);
        let mut src: &[u8] = s;
        buf.fill(&mut src, s.len()).unwrap();
        parse(&mut buf, &mut src, &Limits::default())
    }

    #[test]
    fn parses_a_plain_get_request_line() {
        let rl = parse_str(b"GET / HTTP/1.1\r\n").unwrap();
        assert_eq!(rl.method, b"get");
        assert_eq!(rl.path, b"/");
        assert_eq!(rl.protocol, b"http/1.1");
    }

    #[test]
    fn accepts_bare_lf_terminator_and_http_1_0() {
        let rl = parse_str(b"GET / HTTP/1.0\n").unwrap();
        assert_eq!(rl.protocol, b"http/1.0");
    }

    #[test]
    fn method_at_boundary_length_is_accepted() {
        let method = "M".repeat(16);
        let line = format!("{method} / HTTP/1.1\r\n");
        let rl = parse_str(line.as_bytes()).unwrap();
        assert_eq!(rl.method.len(), 16);
    }

    #[test]
    fn method_over_length_is_rejected() {
        let method = "M".repeat(17);
        let line = format!("{method} / HTTP/1.1\r\n");
        let err = parse_str(line.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), ParseError::InvalidMethod.phrase());
    }

    #[test]
    fn path_at_boundary_length_is_accepted() {
        let path = "/".to_string() + &"a".repeat(1023);
        let line = format!("GET {path} HTTP/1.1\r\n");
        let rl = parse_str(line.as_bytes()).unwrap();
        assert_eq!(rl.path.len(), 1024);
    }

    #[test]
    fn path_over_length_is_rejected() {
        let path = "/".to_string() + &"a".repeat(1024);
        let line = format!("GET {path} HTTP/1.1\r\n");
        let err = parse_str(line.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), ParseError::InvalidRequestTarget.phrase());
    }

    #[test]
    fn trailing_garbage_after_protocol_is_rejected() {
        let err = parse_str(b"GET / HTTP/1.1x\r\n").unwrap_err();
        assert_eq!(err.to_string(), ParseError::InvalidProtocol.phrase());
    }

    #[test]
    fn partial_request_line_eof_is_reported_as_incomplete() {
        let err = parse_str(b"GET / HTTP").unwrap_err();
        assert_eq!(err.to_string(), ParseError::IncompleteRequestBody.phrase());
    }
}

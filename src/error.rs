use std::fmt;
use std::io;

/// The single error kind surfaced by this crate.
///
/// All syntactic and limit violations collapse into one kind carrying a
/// short, stable phrase (see the `Display` impl). Errors here are
/// non-recoverable for the current request: callers must close the
/// connection rather than retry parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The method token was empty, contained whitespace/CR/LF, or
    /// exceeded `Limits::max_method_length` UTF-8 characters.
    InvalidMethod,
    /// The request-target was empty, contained CR/LF, or exceeded
    /// `Limits::max_path_length` UTF-8 characters.
    InvalidRequestTarget,
    /// The protocol token did not match `HTTP/1[.0|.1]?` or was
    /// followed by unexpected bytes before the line terminator.
    InvalidProtocol,
    /// A header key was empty (outside the end-of-headers position),
    /// contained a space before the colon, or exceeded
    /// `Limits::max_header_key_length` UTF-8 characters.
    InvalidHeaderKey,
    /// A header value exceeded `Limits::max_header_value_length` UTF-8
    /// characters.
    InvalidHeaderValue,
    /// More header lines arrived than `Limits::max_header_count`.
    TooManyHeaders,
    /// The `content-length` header value was not a valid non-negative
    /// decimal integer.
    InvalidContentLength,
    /// `content-length` was valid syntax but unusable (e.g. overflowed
    /// the body-left accounting).
    InvalidBodyContentLength,
    /// A chunked-encoding chunk-size line was empty, non-hex, or
    /// exceeded `Limits::max_chunk_size_digits` digits.
    InvalidChunkSize,
    /// The chunk payload was not followed by the expected CRLF/LF
    /// terminator.
    MalformedRequestBody,
    /// The source reached EOF while bytes were still expected for the
    /// body (content-length mode ran dry, or a chunk was cut short).
    IncompleteBody,
    /// The source reached EOF mid-request, after at least one byte of
    /// the request line had already been consumed. Distinguished from
    /// a clean EOF at a request boundary, which `parse_headers`
    /// reports as `Ok(None)` rather than as this error.
    IncompleteRequestBody,
}

impl ParseError {
    /// The exact phrase mandated for this error kind.
    #[must_use]
    pub const fn phrase(self) -> &'static str {
        match self {
            Self::InvalidMethod => "Invalid method",
            Self::InvalidRequestTarget => "Invalid request target",
            Self::InvalidProtocol => "Invalid protocol",
            Self::InvalidHeaderKey => "Invalid header key",
            Self::InvalidHeaderValue => "Invalid header value",
            Self::TooManyHeaders => "Too many headers",
            Self::InvalidContentLength => "Invalid content length",
            Self::InvalidBodyContentLength => "Invalid body content length",
            Self::InvalidChunkSize => "Invalid chunk size",
            Self::MalformedRequestBody => "Malformed request body",
            Self::IncompleteBody => "Incomplete body",
            Self::IncompleteRequestBody => "Incomplete request body",
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for io::Error {
    fn from(err: ParseError) -> Self {
        io::Error::other(err)
    }
}

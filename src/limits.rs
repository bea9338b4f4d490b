/// Compile-time-configurable bounds enforced while parsing a request.
///
/// The defaults mirror the limits this parser's design is built around;
/// the fields are `pub` and the builder methods below exist so a
/// deployment can raise or lower them per `Parser` instance (useful for
/// tests exercising boundary behavior without recompiling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Bytes the buffer is pre-reserved to on construction.
    pub initial_buffer_size: usize,
    /// Buffer length threshold above which compaction is considered.
    pub buffer_trim_min_len: usize,
    /// Cursor position threshold above which compaction is considered.
    pub buffer_trim_min_pos: usize,
    /// Max bytes requested per `fill` while reading headers.
    pub max_headers_read_length: usize,
    /// Max bytes requested per source read while draining a body.
    pub max_body_read_length: usize,
    /// Max UTF-8 characters in the method token.
    pub max_method_length: usize,
    /// Max UTF-8 characters in the request-target.
    pub max_path_length: usize,
    /// Max UTF-8 characters in a header key.
    pub max_header_key_length: usize,
    /// Max UTF-8 characters in a header value.
    pub max_header_value_length: usize,
    /// Max number of header lines per request.
    pub max_header_count: usize,
    /// Max hex digits in a chunked-encoding chunk-size line.
    pub max_chunk_size_digits: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            initial_buffer_size: 4096,
            buffer_trim_min_len: 4096,
            buffer_trim_min_pos: 2048,
            max_headers_read_length: 4096,
            max_body_read_length: 1 << 20,
            max_method_length: 16,
            max_path_length: 1024,
            max_header_key_length: 128,
            max_header_value_length: 2048,
            max_header_count: 128,
            max_chunk_size_digits: 16,
        }
    }
}

impl Limits {
    /// Start from the defaults above.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_method_length(mut self, n: usize) -> Self {
        self.max_method_length = n;
        self
    }

    #[must_use]
    pub fn max_path_length(mut self, n: usize) -> Self {
        self.max_path_length = n;
        self
    }

    #[must_use]
    pub fn max_header_key_length(mut self, n: usize) -> Self {
        self.max_header_key_length = n;
        self
    }

    #[must_use]
    pub fn max_header_value_length(mut self, n: usize) -> Self {
        self.max_header_value_length = n;
        self
    }

    #[must_use]
    pub fn max_header_count(mut self, n: usize) -> Self {
        self.max_header_count = n;
        self
    }

    #[must_use]
    pub fn max_chunk_size_digits(mut self, n: usize) -> Self {
        self.max_chunk_size_digits = n;
        self
    }

    #[must_use]
    pub fn max_body_read_length(mut self, n: usize) -> Self {
        self.max_body_read_length = n;
        self
    }
}

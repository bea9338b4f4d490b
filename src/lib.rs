//! Incremental, keep-alive-aware HTTP/1.x request parser over a
//! pluggable byte source.
//!
//! A [`Parser`] owns a single growable buffer shared between header
//! parsing and body buffering, and is driven one request at a time:
//! [`Parser::parse_headers`], then either [`Parser::read_body`] or
//! repeated [`Parser::read_body_chunk`] calls, then
//! [`Parser::is_complete`]. The same instance is reused across requests
//! on a keep-alive connection; only the buffer's unread tail carries
//! over between requests, everything else resets.

mod body;
mod buffer;
mod error;
mod header;
mod headers;
mod limits;
mod parser;
mod request_line;
mod source;

pub use body::BodyMode;
pub use error::ParseError;
pub use headers::{HeaderValue, Headers};
pub use limits::Limits;
pub use parser::Parser;
pub use source::{ByteSource, CallableSource, Recv, RecvSource};

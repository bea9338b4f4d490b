//! The byte-source contract.
//!
//! Four source strategies are recognized conceptually: a native
//! blocking read, a datagram/stream `recv`, a "read partial" (return as
//! soon as at least one byte is available) operation, and an opaque
//! callable that hands back a byte string or `None` on EOF. Rust's
//! `std::io::Read` already unifies the first and third (a socket's
//! `read` returns as soon as some data is ready; it never waits for a
//! full buffer), so this crate only needs two concrete adapters beyond
//! the blanket `Read` impl: `RecvSource` for `recv`-shaped backends and
//! `CallableSource` for the opaque-function case.
//!
//! The strategy is fixed by the concrete type chosen for `Parser<S>` at
//! construction time and resolved statically through monomorphization,
//! so there is no dynamic dispatch per byte read.

use std::io::{self, Read};

use bytes::BufMut;

/// Appends bytes into a destination buffer on demand.
///
/// Implementations should behave like a partial read: returning fewer
/// bytes than `max_len` is always acceptable, and a return of `0`
/// signals end-of-stream.
pub trait ByteSource {
    /// Append up to `max_len` bytes to the end of `dst`. Returns the
    /// number of bytes appended; `0` means end-of-stream.
    fn fill(&mut self, dst: &mut bytes::BytesMut, max_len: usize) -> io::Result<usize>;
}

/// Any `std::io::Read` is a valid byte source: a single blocking read
/// call that appends whatever is immediately available.
impl<T: Read> ByteSource for T {
    fn fill(&mut self, dst: &mut bytes::BytesMut, max_len: usize) -> io::Result<usize> {
        let start = dst.len();
        dst.resize(start + max_len, 0);
        let n = self.read(&mut dst[start..start + max_len])?;
        dst.truncate(start + n);
        Ok(n)
    }
}

/// A backend exposing a `recv`-shaped read, e.g. a datagram socket.
///
/// Distinct from `std::io::Read` because some transports (datagram
/// sockets, `recv`-based APIs) do not implement `Read` directly.
pub trait Recv {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Wraps a [`Recv`] backend so it satisfies [`ByteSource`].
pub struct RecvSource<T> {
    inner: T,
}

impl<T> RecvSource<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Recv> ByteSource for RecvSource<T> {
    fn fill(&mut self, dst: &mut bytes::BytesMut, max_len: usize) -> io::Result<usize> {
        let start = dst.len();
        dst.resize(start + max_len, 0);
        let n = self.inner.recv(&mut dst[start..start + max_len])?;
        dst.truncate(start + n);
        Ok(n)
    }
}

/// Wraps an opaque callable `FnMut(max_len) -> io::Result<Option<Vec<u8>>>`.
/// Returning `None` signals EOF; `Some(bytes)` may be shorter than
/// `max_len`.
pub struct CallableSource<F> {
    call: F,
}

impl<F> CallableSource<F>
where
    F: FnMut(usize) -> io::Result<Option<Vec<u8>>>,
{
    pub fn new(call: F) -> Self {
        Self { call }
    }
}

impl<F> ByteSource for CallableSource<F>
where
    F: FnMut(usize) -> io::Result<Option<Vec<u8>>>,
{
    fn fill(&mut self, dst: &mut bytes::BytesMut, max_len: usize) -> io::Result<usize> {
        match (self.call)(max_len)? {
            Some(bytes) => {
                dst.put_slice(&bytes);
                Ok(bytes.len())
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn read_source_fills_from_a_slice() {
        let mut src: &[u8] = b"hello world";
        let mut dst = BytesMut::new();
        let n = src.fill(&mut dst, 5).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&dst[..], b"hello");
    }

    #[test]
    fn read_source_signals_eof_with_zero() {
        let mut src: &[u8] = b"";
        let mut dst = BytesMut::new();
        let n = src.fill(&mut dst, 16).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn callable_source_forwards_chunks_and_eof() {
        let mut chunks = vec![Some(b"ab".to_vec()), Some(b"cd".to_vec()), None];
        let mut src = CallableSource::new(move |_max_len| Ok(chunks.remove(0)));
        let mut dst = BytesMut::new();
        assert_eq!(src.fill(&mut dst, 64).unwrap(), 2);
        assert_eq!(src.fill(&mut dst, 64).unwrap(), 2);
        assert_eq!(src.fill(&mut dst, 64).unwrap(), 0);
        assert_eq!(&dst[..], b"abcd");
    }
}

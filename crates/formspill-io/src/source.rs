//! Byte sources the [`Scanner`](crate::Scanner) can pull from.
//!
//! A [`ByteSource`] is the narrowest capability the scanner needs: "read up
//! to N bytes into this buffer". End-of-stream is reported explicitly as
//! `Ok(None)` so that a source which returns zero bytes without finishing
//! can be told apart from one that is done.

use asupersync::io::{AsyncRead, ReadBuf};
use std::future::poll_fn;
use std::io;
use std::pin::Pin;
use std::task::Poll;

/// An asynchronous producer of bytes.
///
/// `read` fills a prefix of `buf` and returns:
///
/// - `Ok(Some(n))` when `n` bytes were written (`n` may be 0 if the source
///   made no progress this time),
/// - `Ok(None)` once the stream has ended,
/// - `Err(_)` on an underlying I/O failure.
#[allow(async_fn_in_trait)]
pub trait ByteSource {
    /// Read up to `buf.len()` bytes into `buf`.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

impl ByteSource for &[u8] {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        if self.is_empty() {
            return Ok(None);
        }
        let n = buf.len().min(self.len());
        let (head, tail) = self.split_at(n);
        buf[..n].copy_from_slice(head);
        *self = tail;
        Ok(Some(n))
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        (**self).read(buf).await
    }
}

/// Adapts any asupersync [`AsyncRead`] (a TCP stream, a request body) into a
/// [`ByteSource`].
///
/// A zero-length read into a non-empty buffer is end-of-stream, as
/// `AsyncRead` defines it.
#[derive(Debug)]
pub struct AsyncSource<R> {
    inner: R,
}

impl<R> AsyncSource<R> {
    /// Wrap an async reader.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Get a reference to the wrapped reader.
    #[must_use]
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the reader.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: AsyncRead + Unpin> ByteSource for AsyncSource<R> {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        if buf.is_empty() {
            return Ok(Some(0));
        }
        let inner = &mut self.inner;
        let n = poll_fn(|cx| {
            let mut read_buf = ReadBuf::new(&mut *buf);
            match Pin::new(&mut *inner).poll_read(cx, &mut read_buf) {
                Poll::Ready(Ok(())) => Poll::Ready(Ok(read_buf.filled().len())),
                Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
                Poll::Pending => Poll::Pending,
            }
        })
        .await?;
        Ok(if n == 0 { None } else { Some(n) })
    }
}

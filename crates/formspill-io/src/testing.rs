//! Byte sources for tests.
//!
//! These sources make the chunking of a stream explicit so tests can place
//! fill boundaries exactly where they want them.

use crate::ByteSource;
use std::io;

/// Serves a fixed payload in chunks of at most `chunk_size` bytes.
#[derive(Debug, Clone)]
pub struct ChunkedSource {
    data: Vec<u8>,
    pos: usize,
    chunk_size: usize,
    empty_reads: usize,
    pending_empty: usize,
}

impl ChunkedSource {
    /// Create a source that delivers `data` in `chunk_size` pieces.
    ///
    /// A `chunk_size` of zero is treated as one.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>, chunk_size: usize) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk_size: chunk_size.max(1),
            empty_reads: 0,
            pending_empty: 0,
        }
    }

    /// Return `count` zero-byte reads before every non-empty chunk.
    #[must_use]
    pub fn with_empty_reads(mut self, count: usize) -> Self {
        self.empty_reads = count;
        self.pending_empty = count;
        self
    }

    /// Bytes not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl ByteSource for ChunkedSource {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        if self.pending_empty > 0 {
            self.pending_empty -= 1;
            return Ok(Some(0));
        }
        self.pending_empty = self.empty_reads;

        let n = buf.len().min(self.chunk_size).min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(Some(n))
    }
}

/// A misbehaving source that never delivers data and never finishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StalledSource;

impl ByteSource for StalledSource {
    async fn read(&mut self, _buf: &mut [u8]) -> io::Result<Option<usize>> {
        Ok(Some(0))
    }
}

/// Delivers a prefix, then fails with the given error kind.
#[derive(Debug, Clone)]
pub struct FailingSource {
    prefix: ChunkedSource,
    kind: io::ErrorKind,
}

impl FailingSource {
    /// Serve `prefix` in `chunk_size` pieces, then fail with `kind`.
    #[must_use]
    pub fn new(prefix: impl Into<Vec<u8>>, chunk_size: usize, kind: io::ErrorKind) -> Self {
        Self {
            prefix: ChunkedSource::new(prefix, chunk_size),
            kind,
        }
    }
}

impl ByteSource for FailingSource {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.prefix.read(buf).await? {
            Some(n) => Ok(Some(n)),
            None => Err(io::Error::new(self.kind, "source failed")),
        }
    }
}

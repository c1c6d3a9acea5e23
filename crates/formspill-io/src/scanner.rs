//! Bounded-memory buffered scanner.
//!
//! [`Scanner`] presents a [`ByteSource`] as a sequence of delimiter-bounded
//! chunks. It owns a single fixed-size buffer and never holds more than
//! `capacity` unconsumed bytes.
//!
//! # Buffer layout
//!
//! ```text
//! 0          read_pos          write_pos          capacity
//! |  consumed  |     unread      |      free        |
//! ```
//!
//! When the unread region lacks the delimiter the scanner compacts (moves
//! the unread bytes to index 0) and reads more into the free tail. Slices
//! handed out borrow the buffer, so the borrow checker guarantees they are
//! gone before the next compaction.
//!
//! # Example
//!
//! ```ignore
//! use formspill_io::Scanner;
//!
//! let mut scanner = Scanner::new(&b"first\r\nsecond"[..]);
//! let line = scanner.read_line(true).await?.unwrap();
//! assert_eq!(line.bytes, b"first");
//! ```

use crate::error::ScanError;
use crate::source::ByteSource;

/// Default buffer capacity (4KB).
pub const DEFAULT_CAPACITY: usize = 4096;

/// Smallest buffer capacity a scanner will use.
pub const MIN_CAPACITY: usize = 16;

/// Consecutive zero-byte reads tolerated before a fill gives up.
pub const MAX_EMPTY_READS: usize = 100;

/// A chunk returned by [`Scanner::read_slice`] or [`Scanner::read_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// The bytes of the chunk, borrowed from the scanner's buffer.
    pub bytes: &'a [u8],
    /// False when the chunk has no delimiter: the tail of the stream, or a
    /// partial line that did not fit in the buffer.
    pub complete: bool,
    /// True when the chunk stopped only because the buffer filled up; the
    /// rest of the line follows in later chunks.
    pub truncated: bool,
}

impl Line<'_> {
    /// Length of the chunk in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Outcome of a delimiter search over the unread region.
enum Scan {
    /// Delimiter found; the chunk ends (exclusive) at this buffer index.
    Found(usize),
    /// End of stream with unread bytes but no delimiter.
    Tail,
    /// End of stream with nothing left.
    Exhausted,
}

/// Buffered, delimiter-oriented reader over a [`ByteSource`].
#[derive(Debug)]
pub struct Scanner<S> {
    source: S,
    buf: Vec<u8>,
    read_pos: usize,
    write_pos: usize,
    eof: bool,
}

impl<S: ByteSource> Scanner<S> {
    /// Create a scanner with the default capacity.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, source)
    }

    /// Create a scanner with the given buffer capacity.
    ///
    /// Capacities below [`MIN_CAPACITY`] are raised to it.
    #[must_use]
    pub fn with_capacity(capacity: usize, source: S) -> Self {
        Self {
            source,
            buf: vec![0; capacity.max(MIN_CAPACITY)],
            read_pos: 0,
            write_pos: 0,
            eof: false,
        }
    }

    /// Returns the buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the unread bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> &[u8] {
        &self.buf[self.read_pos..self.write_pos]
    }

    /// Returns true once the source has reported end-of-stream.
    ///
    /// Buffered bytes may still be unread.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Mark up to `n` buffered bytes as consumed.
    pub fn consume(&mut self, n: usize) {
        self.read_pos = self.read_pos.saturating_add(n).min(self.write_pos);
    }

    /// Unwrap the source. Buffered bytes are discarded.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Read through the next `delimiter`.
    ///
    /// Returns the chunk including the delimiter, the delimiter-less tail at
    /// end-of-stream (`complete == false`), or `None` once nothing is left.
    ///
    /// # Errors
    ///
    /// [`ScanError::BufferFull`] if the buffer is full and holds no
    /// delimiter; the bytes stay buffered. Source failures and
    /// [`ScanError::NoProgress`] are fatal.
    pub async fn read_slice(&mut self, delimiter: u8) -> Result<Option<Line<'_>>, ScanError> {
        let (end, complete) = match self.scan(delimiter).await? {
            Scan::Found(end) => (end, true),
            Scan::Tail => (self.write_pos, false),
            Scan::Exhausted => return Ok(None),
        };
        Ok(Some(self.take(end, complete, false)))
    }

    /// Read the next line.
    ///
    /// A line longer than the buffer is returned in pieces marked
    /// `truncated`. A trailing `\r` on such a piece is held back so that a
    /// `\r\n` split across two fills is always returned whole.
    ///
    /// With `strip_terminator`, a trailing `\r\n` or `\n` is removed from
    /// complete lines.
    pub async fn read_line(&mut self, strip_terminator: bool) -> Result<Option<Line<'_>>, ScanError> {
        let (end, complete, truncated) = match self.scan(b'\n').await {
            Ok(Scan::Found(end)) => (end, true, false),
            Ok(Scan::Tail) => (self.write_pos, false, false),
            Ok(Scan::Exhausted) => return Ok(None),
            Err(ScanError::BufferFull { .. }) => {
                let mut end = self.write_pos;
                if !self.eof && self.buf[end - 1] == b'\r' {
                    end -= 1;
                }
                (end, self.eof, !self.eof)
            }
            Err(err) => return Err(err),
        };

        let line = self.take(end, complete, truncated);
        if strip_terminator && complete {
            Ok(Some(Line {
                bytes: strip_line_terminator(line.bytes),
                complete,
                truncated,
            }))
        } else {
            Ok(Some(line))
        }
    }

    fn take(&mut self, end: usize, complete: bool, truncated: bool) -> Line<'_> {
        let start = self.read_pos;
        self.read_pos = end;
        Line {
            bytes: &self.buf[start..end],
            complete,
            truncated,
        }
    }

    async fn scan(&mut self, delimiter: u8) -> Result<Scan, ScanError> {
        // Bytes after read_pos already known not to contain the delimiter.
        let mut scanned = 0;
        loop {
            let from = self.read_pos + scanned;
            if let Some(i) = memchr::memchr(delimiter, &self.buf[from..self.write_pos]) {
                return Ok(Scan::Found(from + i + 1));
            }
            scanned = self.write_pos - self.read_pos;

            if self.eof {
                return Ok(if scanned == 0 {
                    Scan::Exhausted
                } else {
                    Scan::Tail
                });
            }
            if scanned >= self.buf.len() {
                return Err(ScanError::BufferFull { len: scanned });
            }
            self.fill().await?;
        }
    }

    async fn fill(&mut self) -> Result<(), ScanError> {
        if self.read_pos > 0 {
            self.buf.copy_within(self.read_pos..self.write_pos, 0);
            self.write_pos -= self.read_pos;
            self.read_pos = 0;
        }
        if self.write_pos == self.buf.len() {
            return Err(ScanError::Internal("buffer already full"));
        }

        for _ in 0..MAX_EMPTY_READS {
            let free = self.buf.len() - self.write_pos;
            match self.source.read(&mut self.buf[self.write_pos..]).await? {
                None => {
                    tracing::trace!(buffered = self.write_pos, "byte source reached end of stream");
                    self.eof = true;
                    return Ok(());
                }
                Some(0) => {}
                Some(n) => {
                    self.write_pos += n.min(free);
                    tracing::trace!(read = n, buffered = self.write_pos, "scanner filled");
                    return Ok(());
                }
            }
        }

        Err(ScanError::NoProgress {
            attempts: MAX_EMPTY_READS,
        })
    }
}

/// Remove a trailing `\r\n` or `\n`.
#[must_use]
pub fn strip_line_terminator(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_suffix(b"\r\n")
        .or_else(|| bytes.strip_suffix(b"\n"))
        .unwrap_or(bytes)
}

/// Remove trailing ASCII whitespace (spaces, tabs, CR, LF).
#[must_use]
pub fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

//! Scanner error type.

/// Errors produced by the [`Scanner`](crate::Scanner).
///
/// Only [`ScanError::BufferFull`] is recoverable: the buffered bytes are
/// still held by the scanner and can be inspected with
/// [`Scanner::buffered`](crate::Scanner::buffered). Everything else means the
/// stream cannot be read any further.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The delimiter was not found and the buffer has no room left to keep
    /// searching.
    #[error("delimiter not found within {len} buffered bytes")]
    BufferFull {
        /// Number of bytes currently buffered (always the full capacity).
        len: usize,
    },

    /// The source kept returning zero bytes without reaching end-of-stream.
    #[error("byte source made no progress after {attempts} empty reads")]
    NoProgress {
        /// Number of consecutive empty reads tolerated before giving up.
        attempts: usize,
    },

    /// An internal invariant was violated.
    #[error("scanner invariant violated: {0}")]
    Internal(&'static str),

    /// The underlying source failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Returns true if the scanner can still be used after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::BufferFull { .. })
    }
}

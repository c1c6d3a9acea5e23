//! Bounded-memory buffered scanning over async byte sources.
//!
//! This crate provides the I/O layer the multipart decoder is built on:
//!
//! - [`ByteSource`]: the "read up to N bytes" capability, with explicit
//!   end-of-stream
//! - [`AsyncSource`]: adapts any asupersync `AsyncRead`
//! - [`Scanner`]: fixed-capacity buffer exposing line and delimiter reads
//!
//! # Memory bound
//!
//! A scanner never holds more than its capacity in unconsumed bytes. When a
//! delimiter does not appear within that window it reports
//! [`ScanError::BufferFull`] (or, for lines, returns a partial piece) rather
//! than growing.
//!
//! # Example
//!
//! ```ignore
//! use formspill_io::{AsyncSource, Scanner};
//!
//! let mut scanner = Scanner::with_capacity(8192, AsyncSource::new(stream));
//! while let Some(line) = scanner.read_line(true).await? {
//!     handle(line.bytes);
//! }
//! ```

#![forbid(unsafe_code)]

mod error;
pub mod scanner;
mod source;
pub mod testing;

pub use error::ScanError;
pub use scanner::{
    DEFAULT_CAPACITY, Line, MAX_EMPTY_READS, MIN_CAPACITY, Scanner, strip_line_terminator,
    trim_trailing_whitespace,
};
pub use source::{AsyncSource, ByteSource};

//! Streaming `multipart/form-data` decoding for formspill.
//!
//! This crate provides:
//! - [`MultipartDecoder`] with a materializing ([`MultipartDecoder::read_all`])
//!   and a streaming ([`MultipartDecoder::parts`]) entry point
//! - [`DecoderConfig`] for size limits, spill behavior and output naming
//! - [`Form`], [`PartValue`] and [`Attachment`] for decoded data
//! - [`MultipartError`] with an HTTP-oriented [`ErrorKind`]
//!
//! # Spilling
//!
//! Attachments up to `max_in_memory_size` bytes stay in memory. Larger ones
//! (or all of them, with the default ceiling of 0) are written to
//! `<filename_prefix><unique>.<ext>` in the output directory, where `ext`
//! comes from the part's content type. Spilled files handed to the caller
//! are the caller's to remove; files of parts that never completed are
//! removed by the decoder.
//!
//! # Logging
//!
//! Decoding emits `tracing` events: `debug` per decoded part and per spill,
//! `warn` when an attachment is skipped after a local I/O failure.

#![forbid(unsafe_code)]

mod config;
mod error;
mod headers;
pub mod media;
mod multipart;
mod part;
mod sink;

pub use config::{
    DEFAULT_BUFFER_SIZE, DEFAULT_MAX_FIELD_SIZE, DEFAULT_MAX_FILE_SIZE,
    DEFAULT_MAX_IN_MEMORY_SIZE, DEFAULT_MAX_PARTS, DEFAULT_MAX_TOTAL_SIZE, DecoderConfig,
};
pub use error::{ErrorKind, MultipartError};
pub use headers::{
    Disposition, MAX_BOUNDARY_LEN, MAX_PART_HEADERS, parse_boundary, parse_content_disposition,
};
pub use multipart::{MultipartDecoder, PartStream};
pub use part::{Attachment, Form, PartOutcome, PartValue, Storage};

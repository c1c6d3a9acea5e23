//! Bounded-memory `multipart/form-data` decoding.
//!
//! formspill splits a request body into named text fields and file
//! attachments without ever holding more than a fixed buffer of the body in
//! memory:
//!
//! - **Bounded scanning**: a fixed-capacity line scanner over any async byte source
//! - **Spill to disk**: attachments over a configurable ceiling stream to files
//! - **Hard limits**: per-file, per-field, total size and part count ceilings
//! - **Two entry points**: decode the whole form, or stream parts in order
//!
//! # Quick Start
//!
//! ```
//! use formspill::prelude::*;
//!
//! let body = concat!(
//!     "--XyZ\r\n",
//!     "Content-Disposition: form-data; name=\"title\"\r\n",
//!     "\r\n",
//!     "Quarterly report\r\n",
//!     "--XyZ\r\n",
//!     "Content-Disposition: form-data; name=\"report\"; filename=\"q3.csv\"\r\n",
//!     "Content-Type: text/csv\r\n",
//!     "\r\n",
//!     "region,total\r\n",
//!     "north,12\r\n",
//!     "--XyZ--\r\n",
//! );
//!
//! let config = DecoderConfig::new().max_in_memory_size(64 * 1024);
//! let form = futures_executor::block_on(formspill::decode_form(
//!     "multipart/form-data; boundary=XyZ",
//!     body.as_bytes(),
//!     config,
//! ))
//! .unwrap();
//!
//! assert_eq!(form.field("title"), Some("Quarterly report"));
//! let report = form.file("report").unwrap();
//! assert_eq!(report.bytes().unwrap(), b"region,total\r\nnorth,12");
//! ```
//!
//! # Crate Structure
//!
//! - [`formspill_io`]: Buffered scanner and byte sources
//! - [`formspill_core`]: Multipart decoder, configuration and errors

#![forbid(unsafe_code)]

// Re-export crates
pub use formspill_core as core;
pub use formspill_io as io;

// Re-export commonly used types
pub use formspill_core::{
    Attachment, DecoderConfig, ErrorKind, Form, MultipartDecoder, MultipartError, PartOutcome,
    PartStream, PartValue, Storage,
};
pub use formspill_io::{AsyncSource, ByteSource, ScanError, Scanner};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Attachment, ByteSource, DecoderConfig, ErrorKind, Form, MultipartDecoder,
        MultipartError, PartValue, Storage,
    };
}

/// Decode a whole multipart body in one call.
///
/// Equivalent to constructing a [`MultipartDecoder`] and calling
/// [`MultipartDecoder::read_all`].
pub async fn decode_form<S: ByteSource>(
    content_type: &str,
    source: S,
    config: DecoderConfig,
) -> Result<Form, MultipartError> {
    let mut decoder = MultipartDecoder::new(content_type, source, config)?;
    decoder.read_all().await
}

//! Multipart decoding errors.
//!
//! Errors fall into three groups, reported by [`MultipartError::kind`]:
//!
//! ```text
//!   BadRequest       ← the body or its headers are malformed (HTTP 400)
//!   PayloadTooLarge  ← a configured size or count ceiling was passed (HTTP 413)
//!   Internal         ← misuse, bad configuration, or a failing byte source
//! ```
//!
//! Local I/O failures while writing a single attachment are not errors at
//! all: the attachment is skipped and decoding continues.

use formspill_io::ScanError;

/// Broad classification of a [`MultipartError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request is malformed.
    BadRequest,
    /// A size or count limit was exceeded.
    PayloadTooLarge,
    /// The decoder was misused or the byte source failed.
    Internal,
}

/// Errors that can occur while decoding a multipart body.
#[derive(Debug, thiserror::Error)]
pub enum MultipartError {
    /// Missing boundary in Content-Type header.
    #[error("missing boundary in multipart Content-Type")]
    MissingBoundary,

    /// Invalid boundary or not a `multipart/form-data` content type.
    #[error("invalid multipart boundary")]
    InvalidBoundary,

    /// The body ended before the opening boundary was seen.
    #[error("boundary not found in multipart body")]
    BoundaryNotFound,

    /// Missing Content-Disposition header in a part.
    #[error("missing Content-Disposition header in part")]
    MissingContentDisposition,

    /// Invalid Content-Disposition header.
    #[error("invalid Content-Disposition: {detail}")]
    InvalidContentDisposition { detail: String },

    /// Invalid part headers.
    #[error("invalid part headers: {detail}")]
    InvalidPartHeaders { detail: String },

    /// A file part declared a content type with no known file extension.
    #[error("unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// A text field was not valid UTF-8.
    #[error("field {name:?} is not valid UTF-8")]
    InvalidUtf8 { name: String },

    /// The body ended in the middle of a part.
    #[error("unexpected end of multipart data")]
    UnexpectedEof,

    /// File size exceeds limit.
    #[error("file too large: {size} bytes exceeds limit of {max}")]
    FileTooLarge { size: usize, max: usize },

    /// Text field size exceeds limit.
    #[error("field {name:?} too large: {size} bytes exceeds limit of {max}")]
    FieldTooLarge {
        name: String,
        size: usize,
        max: usize,
    },

    /// Total upload size exceeds limit.
    #[error("total upload too large: {size} bytes exceeds limit of {max}")]
    TotalTooLarge { size: usize, max: usize },

    /// Too many parts.
    #[error("too many parts: {count} exceeds limit of {max}")]
    TooManyParts { count: usize, max: usize },

    /// The decoder has already been consumed by one of its entry points.
    #[error("multipart body is already being read")]
    AlreadyReading,

    /// The decoder configuration was rejected.
    #[error("invalid decoder configuration: {detail}")]
    InvalidConfig { detail: String },

    /// The byte source failed or misbehaved.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl MultipartError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingBoundary
            | Self::InvalidBoundary
            | Self::BoundaryNotFound
            | Self::MissingContentDisposition
            | Self::InvalidContentDisposition { .. }
            | Self::InvalidPartHeaders { .. }
            | Self::UnsupportedContentType { .. }
            | Self::InvalidUtf8 { .. }
            | Self::UnexpectedEof => ErrorKind::BadRequest,
            Self::FileTooLarge { .. }
            | Self::FieldTooLarge { .. }
            | Self::TotalTooLarge { .. }
            | Self::TooManyParts { .. } => ErrorKind::PayloadTooLarge,
            Self::AlreadyReading | Self::InvalidConfig { .. } | Self::Scan(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// The HTTP status code a server should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::BadRequest => 400,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::Internal => 500,
        }
    }

    pub(crate) fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_headers(detail: impl Into<String>) -> Self {
        Self::InvalidPartHeaders {
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_disposition(detail: impl Into<String>) -> Self {
        Self::InvalidContentDisposition {
            detail: detail.into(),
        }
    }
}

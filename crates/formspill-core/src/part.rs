//! Decoded parts: text fields, attachments and the materialized form.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Where an attachment's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Small attachment kept in memory.
    InMemory(Vec<u8>),
    /// Attachment spilled to a file in the output directory.
    OnDisk(PathBuf),
}

/// An uploaded file.
///
/// Spilled files are not removed when an `Attachment` is dropped; they
/// belong to the caller. Use [`Attachment::discard`] to delete one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The field name.
    pub name: String,
    /// The original filename, if the client sent one.
    pub filename: Option<String>,
    /// Content-Type of the file, as sent.
    pub content_type: String,
    /// The file's bytes.
    pub storage: Storage,
    size: u64,
}

impl Attachment {
    /// Create an attachment held in memory.
    #[must_use]
    pub fn in_memory(
        name: impl Into<String>,
        filename: Option<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            filename,
            content_type: content_type.into(),
            size: u64::try_from(data.len()).unwrap_or(u64::MAX),
            storage: Storage::InMemory(data),
        }
    }

    /// Create an attachment backed by a file of `size` bytes.
    #[must_use]
    pub fn on_disk(
        name: impl Into<String>,
        filename: Option<String>,
        content_type: impl Into<String>,
        path: PathBuf,
        size: u64,
    ) -> Self {
        Self {
            name: name.into(),
            filename,
            content_type: content_type.into(),
            storage: Storage::OnDisk(path),
            size,
        }
    }

    /// Get the file size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns true when this file was spilled to disk.
    #[must_use]
    pub fn is_on_disk(&self) -> bool {
        matches!(self.storage, Storage::OnDisk(_))
    }

    /// Path to the spilled file, if this attachment is backed by disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            Storage::InMemory(_) => None,
            Storage::OnDisk(path) => Some(path),
        }
    }

    /// Read the attachment's bytes regardless of where they live.
    pub fn bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.storage {
            Storage::InMemory(data) => Ok(data.clone()),
            Storage::OnDisk(path) => std::fs::read(path),
        }
    }

    /// Get the file extension from the original filename.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let filename = self.filename.as_deref()?;
        filename
            .rsplit('.')
            .next()
            .filter(|ext| !ext.is_empty() && *ext != filename)
    }

    /// Delete the spilled file, if any. A file that is already gone is fine.
    pub fn discard(self) -> std::io::Result<()> {
        if let Storage::OnDisk(path) = &self.storage {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

/// The value of one decoded part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    /// A text field.
    Field(String),
    /// A file attachment.
    File(Attachment),
}

impl PartValue {
    /// Returns true if this part is a file upload.
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// The field text, for text parts.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Field(text) => Some(text),
            Self::File(_) => None,
        }
    }

    /// The attachment, for file parts.
    #[must_use]
    pub fn into_file(self) -> Option<Attachment> {
        match self {
            Self::Field(_) => None,
            Self::File(file) => Some(file),
        }
    }
}

/// What became of one part.
///
/// Fatal problems are reported as `Err` alongside this type.
#[derive(Debug)]
pub enum PartOutcome {
    /// The part decoded completely.
    Ready { name: String, value: PartValue },
    /// The part's output could not be written; its bytes were discarded.
    Skipped { name: String, reason: String },
}

/// A fully decoded multipart form.
///
/// Text fields are keyed by name; a repeated name keeps the last value.
/// Attachments are kept in input order.
#[derive(Debug, Default)]
pub struct Form {
    fields: HashMap<String, String>,
    files: Vec<Attachment>,
}

impl Form {
    /// Create an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a decoded part.
    pub fn insert(&mut self, name: String, value: PartValue) {
        match value {
            PartValue::Field(text) => {
                self.fields.insert(name, text);
            }
            PartValue::File(file) => self.files.push(file),
        }
    }

    /// Get a text field's value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Get the first attachment uploaded under `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&Attachment> {
        self.files.iter().find(|f| f.name == name)
    }

    /// All attachments uploaded under `name`, in input order.
    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Attachment> + 'a {
        self.files.iter().filter(move |f| f.name == name)
    }

    /// All text fields.
    #[must_use]
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// All attachments, in input order.
    #[must_use]
    pub fn files(&self) -> &[Attachment] {
        &self.files
    }

    /// Split into the field map and the attachment list.
    #[must_use]
    pub fn into_parts(self) -> (HashMap<String, String>, Vec<Attachment>) {
        (self.fields, self.files)
    }

    /// Number of distinct fields plus attachments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len() + self.files.len()
    }

    /// Returns true if the form has no fields and no attachments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// Delete every spilled attachment and empty the file list.
    pub(crate) fn discard_files(&mut self) {
        for file in self.files.drain(..) {
            if let Err(err) = file.discard() {
                tracing::warn!(error = %err, "failed to remove spilled attachment");
            }
        }
    }
}

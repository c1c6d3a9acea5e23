//! Per-part output: in-memory buffers, spill files and text accumulation.
//!
//! Payload lines arrive with their terminators. The terminator of the most
//! recent line is held back until the next line arrives, because the one in
//! front of a boundary belongs to the boundary and never reaches the output.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::DecoderConfig;
use crate::error::MultipartError;
use crate::part::{Attachment, PartOutcome, PartValue};

static SPILL_COUNTER: AtomicU64 = AtomicU64::new(1);

fn unique_suffix() -> String {
    let ts_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let counter = SPILL_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{ts_nanos}-{counter}", std::process::id())
}

/// Split a raw line into payload and terminator.
fn split_terminator(line: &[u8]) -> (&[u8], &'static [u8]) {
    if let Some(body) = line.strip_suffix(b"\r\n") {
        (body, b"\r\n")
    } else if let Some(body) = line.strip_suffix(b"\n") {
        (body, b"\n")
    } else {
        (line, b"")
    }
}

/// Directory spilled attachments go to, resolved on first use.
#[derive(Debug)]
pub(crate) struct SpillTarget {
    dir: Option<PathBuf>,
    prefix: String,
}

impl SpillTarget {
    pub(crate) fn new(config: &DecoderConfig) -> Self {
        Self {
            dir: config.get_output_dir().map(PathBuf::from),
            prefix: config.get_filename_prefix().to_string(),
        }
    }

    /// The output directory, if one is configured or has been created.
    pub(crate) fn dir(&self) -> Option<&std::path::Path> {
        self.dir.as_deref()
    }

    fn ensure_dir(&mut self) -> std::io::Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        let temp_dir = std::env::temp_dir();
        for _ in 0..32 {
            let candidate = temp_dir.join(format!("formspill-{}", unique_suffix()));
            match std::fs::create_dir(&candidate) {
                Ok(()) => {
                    tracing::debug!(dir = %candidate.display(), "created upload directory");
                    self.dir = Some(candidate.clone());
                    return Ok(candidate);
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(err) => return Err(err),
            }
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "failed to allocate unique upload directory",
        ))
    }

    /// Create `<prefix><unique>.<ext>` in the output directory.
    fn create_file(&mut self, ext: &str) -> std::io::Result<(PathBuf, File)> {
        let dir = self.ensure_dir()?;
        for _ in 0..32 {
            let candidate = dir.join(format!("{}{}.{ext}", self.prefix, unique_suffix()));
            match OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&candidate)
            {
                Ok(file) => return Ok((candidate, file)),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(err) => return Err(err),
            }
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "failed to allocate unique upload file",
        ))
    }
}

#[derive(Debug)]
enum Sink {
    Memory(Vec<u8>),
    Disk {
        path: PathBuf,
        writer: BufWriter<File>,
    },
    Failed {
        reason: String,
    },
}

/// An attachment being received.
///
/// Dropping an unfinished upload removes its partially written file.
#[derive(Debug)]
pub(crate) struct FileUpload {
    name: String,
    filename: Option<String>,
    content_type: String,
    extension: String,
    sink: Sink,
    size: usize,
    pending: &'static [u8],
}

impl FileUpload {
    pub(crate) fn open(
        name: String,
        filename: Option<String>,
        content_type: String,
        extension: String,
        config: &DecoderConfig,
        target: &mut SpillTarget,
    ) -> Self {
        let mut upload = Self {
            name,
            filename,
            content_type,
            extension,
            sink: Sink::Memory(Vec::new()),
            size: 0,
            pending: b"",
        };
        if config.get_max_in_memory_size() == 0 {
            upload.spill(target);
        }
        upload
    }

    /// Payload bytes accepted so far.
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// Append one raw line.
    pub(crate) fn append(
        &mut self,
        line: &[u8],
        config: &DecoderConfig,
        target: &mut SpillTarget,
    ) -> Result<(), MultipartError> {
        let (body, terminator) = split_terminator(line);
        let pending = std::mem::take(&mut self.pending);
        self.write(pending, config, target)?;
        self.write(body, config, target)?;
        self.pending = terminator;
        Ok(())
    }

    fn write(
        &mut self,
        bytes: &[u8],
        config: &DecoderConfig,
        target: &mut SpillTarget,
    ) -> Result<(), MultipartError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let next_size = self.size.saturating_add(bytes.len());
        if next_size > config.get_max_file_size() {
            return Err(MultipartError::FileTooLarge {
                size: next_size,
                max: config.get_max_file_size(),
            });
        }
        self.size = next_size;

        match &mut self.sink {
            Sink::Memory(data) => {
                data.extend_from_slice(bytes);
                if next_size > config.get_max_in_memory_size() {
                    self.spill(target);
                }
            }
            Sink::Disk { writer, .. } => {
                let written = writer.write_all(bytes);
                if let Err(err) = written {
                    self.fail("failed to write upload file", &err);
                }
            }
            Sink::Failed { .. } => {}
        }
        Ok(())
    }

    /// Move the part to disk, carrying over anything buffered in memory.
    fn spill(&mut self, target: &mut SpillTarget) {
        let Sink::Memory(data) = &self.sink else {
            return;
        };
        let (path, file) = match target.create_file(&self.extension) {
            Ok(created) => created,
            Err(err) => {
                self.fail("failed to create upload file", &err);
                return;
            }
        };
        tracing::debug!(
            part = %self.name,
            path = %path.display(),
            buffered = data.len(),
            "spilling upload to disk"
        );
        let mut writer = BufWriter::new(file);
        let result = writer.write_all(data);
        self.sink = Sink::Disk { path, writer };
        if let Err(err) = result {
            self.fail("failed to write upload file", &err);
        }
    }

    /// Give up on the output; later bytes are counted and dropped.
    fn fail(&mut self, context: &str, err: &std::io::Error) {
        let reason = format!("{context}: {err}");
        tracing::warn!(part = %self.name, reason = %reason, "skipping attachment");
        let previous = std::mem::replace(&mut self.sink, Sink::Failed { reason });
        if let Sink::Disk { path, writer } = previous {
            drop(writer);
            let _ = std::fs::remove_file(path);
        }
    }

    /// Close the part. The held-back terminator is dropped.
    pub(crate) fn finish(mut self) -> PartOutcome {
        let flushed = match &mut self.sink {
            Sink::Disk { writer, .. } => writer.flush(),
            Sink::Memory(_) | Sink::Failed { .. } => Ok(()),
        };
        if let Err(err) = flushed {
            self.fail("failed to flush upload file", &err);
        }

        let sink = std::mem::replace(&mut self.sink, Sink::Memory(Vec::new()));
        let name = std::mem::take(&mut self.name);
        let filename = self.filename.take();
        let content_type = std::mem::take(&mut self.content_type);
        let size = u64::try_from(self.size).unwrap_or(u64::MAX);
        match sink {
            Sink::Memory(data) => PartOutcome::Ready {
                value: PartValue::File(Attachment::in_memory(
                    name.clone(),
                    filename,
                    content_type,
                    data,
                )),
                name,
            },
            Sink::Disk { path, writer } => {
                drop(writer);
                PartOutcome::Ready {
                    value: PartValue::File(Attachment::on_disk(
                        name.clone(),
                        filename,
                        content_type,
                        path,
                        size,
                    )),
                    name,
                }
            }
            Sink::Failed { reason } => PartOutcome::Skipped { name, reason },
        }
    }
}

impl Drop for FileUpload {
    fn drop(&mut self) {
        // The writer is closed before the unlink so no handle outlives the file.
        let sink = std::mem::replace(&mut self.sink, Sink::Memory(Vec::new()));
        if let Sink::Disk { path, writer } = sink {
            drop(writer);
            let _ = std::fs::remove_file(path);
        }
    }
}

/// A text field being received. Line breaks are normalized to `\n`.
#[derive(Debug)]
pub(crate) struct FieldText {
    name: String,
    text: Vec<u8>,
    pending_newline: bool,
}

impl FieldText {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            text: Vec::new(),
            pending_newline: false,
        }
    }

    /// Bytes accepted so far.
    pub(crate) fn size(&self) -> usize {
        self.text.len()
    }

    /// Append one raw line.
    pub(crate) fn append(&mut self, line: &[u8], max: usize) -> Result<(), MultipartError> {
        let (body, terminator) = split_terminator(line);
        let newline = usize::from(self.pending_newline);
        let next_size = self.text.len() + newline + body.len();
        if next_size > max {
            return Err(MultipartError::FieldTooLarge {
                name: self.name.clone(),
                size: next_size,
                max,
            });
        }
        if self.pending_newline {
            self.text.push(b'\n');
        }
        self.text.extend_from_slice(body);
        self.pending_newline = !terminator.is_empty();
        Ok(())
    }

    /// Close the field, checking its text is UTF-8.
    pub(crate) fn finish(self) -> Result<PartOutcome, MultipartError> {
        match String::from_utf8(self.text) {
            Ok(text) => Ok(PartOutcome::Ready {
                name: self.name,
                value: PartValue::Field(text),
            }),
            Err(_) => Err(MultipartError::InvalidUtf8 { name: self.name }),
        }
    }
}

//! Multipart form data decoder.
//!
//! Decodes `multipart/form-data` request bodies from any [`ByteSource`]
//! without holding the body in memory. Text fields are collected as
//! strings; file parts stay in memory up to a configured ceiling and are
//! spilled to files in the output directory beyond it.
//!
//! # Decode states
//!
//! ```text
//! Preamble ──part marker──▶ AwaitingHeaders ──content-type──▶ StreamingFile ──┐
//!    │                         │    ▲                                            │
//!    │ final marker            │    └───────────── part marker ◀───────────────┤
//!    ▼                         └─no content-type─▶ StreamingField ──────────────┤
//!  Done ◀─────────────────────────────────────────── final marker ◀─────────────┘
//! ```
//!
//! Any fatal error also moves the decoder to `Done`, so a failed decode
//! cannot be resumed.

use formspill_io::{AsyncSource, ByteSource, Scanner};

use crate::config::DecoderConfig;
use crate::error::MultipartError;
use crate::headers::{
    Disposition, Marker, Markers, PartHeaders, parse_boundary, parse_content_disposition,
};
use crate::media::resolve_extension;
use crate::part::{Form, PartOutcome, PartValue};
use crate::sink::{FieldText, FileUpload, SpillTarget};

#[derive(Debug)]
enum State {
    Preamble,
    AwaitingHeaders,
    StreamingField(FieldText),
    StreamingFile(FileUpload),
    Done,
}

fn state_after(marker: Marker) -> State {
    match marker {
        Marker::Part => State::AwaitingHeaders,
        Marker::Final => State::Done,
    }
}

enum Step {
    Continue,
    Emit(PartOutcome),
    Finished,
}

/// Streaming `multipart/form-data` decoder.
///
/// A decoder is read once, either all at once with [`read_all`] or part by
/// part with [`parts`].
///
/// ```
/// use formspill_core::{DecoderConfig, MultipartDecoder};
///
/// let body = concat!(
///     "--xyz\r\n",
///     "Content-Disposition: form-data; name=\"title\"\r\n",
///     "\r\n",
///     "Hello\r\n",
///     "--xyz--\r\n",
/// );
/// let mut decoder = MultipartDecoder::new(
///     "multipart/form-data; boundary=xyz",
///     body.as_bytes(),
///     DecoderConfig::new(),
/// )
/// .unwrap();
/// let form = futures_executor::block_on(decoder.read_all()).unwrap();
/// assert_eq!(form.field("title"), Some("Hello"));
/// ```
///
/// [`read_all`]: MultipartDecoder::read_all
/// [`parts`]: MultipartDecoder::parts
#[derive(Debug)]
pub struct MultipartDecoder<S> {
    scanner: Scanner<S>,
    config: DecoderConfig,
    boundary: String,
    markers: Markers,
    spill: SpillTarget,
    state: State,
    at_line_start: bool,
    parts_seen: usize,
    total_size: usize,
    reading: bool,
}

impl<S: ByteSource> MultipartDecoder<S> {
    /// Create a decoder for a body with the given `Content-Type` header.
    pub fn new(content_type: &str, source: S, config: DecoderConfig) -> Result<Self, MultipartError> {
        let boundary = parse_boundary(content_type)?;
        let config = config.prepared()?;
        let markers = Markers::new(&boundary);
        if config.get_buffer_size() < markers.line_len() {
            return Err(MultipartError::invalid_config(format!(
                "buffer_size {} cannot hold a {}-byte boundary line",
                config.get_buffer_size(),
                markers.line_len()
            )));
        }

        Ok(Self {
            scanner: Scanner::with_capacity(config.get_buffer_size(), source),
            spill: SpillTarget::new(&config),
            config,
            boundary,
            markers,
            state: State::Preamble,
            at_line_start: true,
            parts_seen: 0,
            total_size: 0,
            reading: false,
        })
    }

    /// The boundary parsed from the content type.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The effective configuration.
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Directory spilled attachments are written to: the configured one, or
    /// the temporary directory created on first spill.
    #[must_use]
    pub fn output_dir(&self) -> Option<&std::path::Path> {
        self.spill.dir()
    }

    /// Number of parts whose headers have been read.
    #[must_use]
    pub fn parts_read(&self) -> usize {
        self.parts_seen
    }

    /// Returns true once the final boundary was seen or decoding failed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Recover the byte source.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.scanner.into_inner()
    }

    /// Decode the whole body into a [`Form`].
    ///
    /// Attachments that could not be written are skipped. On error, files
    /// already spilled for this form are removed.
    pub async fn read_all(&mut self) -> Result<Form, MultipartError> {
        self.begin()?;
        let mut form = Form::new();
        loop {
            match self.next_outcome().await {
                Ok(Some(PartOutcome::Ready { name, value })) => form.insert(name, value),
                Ok(Some(PartOutcome::Skipped { .. })) => {}
                Ok(None) => return Ok(form),
                Err(err) => {
                    form.discard_files();
                    return Err(err);
                }
            }
        }
    }

    /// Decode the body one part at a time, in input order.
    pub fn parts(&mut self) -> Result<PartStream<'_, S>, MultipartError> {
        self.begin()?;
        Ok(PartStream { decoder: self })
    }

    fn begin(&mut self) -> Result<(), MultipartError> {
        if self.reading {
            return Err(MultipartError::AlreadyReading);
        }
        self.reading = true;
        Ok(())
    }

    async fn next_outcome(&mut self) -> Result<Option<PartOutcome>, MultipartError> {
        loop {
            match self.step().await? {
                Step::Continue => {}
                Step::Emit(outcome) => {
                    log_outcome(&outcome);
                    return Ok(Some(outcome));
                }
                Step::Finished => return Ok(None),
            }
        }
    }

    async fn step(&mut self) -> Result<Step, MultipartError> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Preamble => self.skip_preamble().await,
            State::AwaitingHeaders => self.read_headers().await,
            State::StreamingField(field) => self.stream_field(field).await,
            State::StreamingFile(upload) => self.stream_file(upload).await,
            State::Done => Ok(Step::Finished),
        }
    }

    async fn skip_preamble(&mut self) -> Result<Step, MultipartError> {
        let Some(line) = self.scanner.read_line(false).await? else {
            return Err(MultipartError::BoundaryNotFound);
        };
        let marker = if self.at_line_start && !line.truncated {
            self.markers.classify(line.bytes)
        } else {
            None
        };
        self.at_line_start = line.bytes.ends_with(b"\n");

        match marker {
            Some(Marker::Part) => {
                self.state = State::AwaitingHeaders;
                Ok(Step::Continue)
            }
            Some(Marker::Final) => Ok(Step::Finished),
            None => {
                self.state = State::Preamble;
                Ok(Step::Continue)
            }
        }
    }

    async fn read_headers(&mut self) -> Result<Step, MultipartError> {
        let mut headers = PartHeaders::default();
        loop {
            let Some(line) = self.scanner.read_line(true).await? else {
                return Err(MultipartError::UnexpectedEof);
            };
            if !line.complete {
                return Err(if self.scanner.is_eof() {
                    MultipartError::UnexpectedEof
                } else {
                    MultipartError::invalid_headers("header line exceeds buffer size")
                });
            }
            if line.bytes.is_empty() {
                break;
            }
            headers.push_line(line.bytes)?;
        }

        self.parts_seen += 1;
        if self.parts_seen > self.config.get_max_parts() {
            return Err(MultipartError::TooManyParts {
                count: self.parts_seen,
                max: self.config.get_max_parts(),
            });
        }

        let disposition = headers
            .get("content-disposition")
            .ok_or(MultipartError::MissingContentDisposition)?;
        let Disposition { name, filename } = parse_content_disposition(disposition)?;

        self.at_line_start = true;
        self.state = match headers.get("content-type") {
            Some(content_type) => {
                let extension = resolve_extension(content_type, self.config.get_extensions())?;
                State::StreamingFile(FileUpload::open(
                    name,
                    filename,
                    content_type.to_string(),
                    extension,
                    &self.config,
                    &mut self.spill,
                ))
            }
            None => State::StreamingField(FieldText::new(name)),
        };
        Ok(Step::Continue)
    }

    async fn stream_field(&mut self, mut field: FieldText) -> Result<Step, MultipartError> {
        let Some(line) = self.scanner.read_line(false).await? else {
            return Err(MultipartError::UnexpectedEof);
        };
        let marker = if self.at_line_start && !line.truncated {
            self.markers.classify(line.bytes)
        } else {
            None
        };
        if let Some(marker) = marker {
            let outcome = field.finish()?;
            self.state = state_after(marker);
            return Ok(Step::Emit(outcome));
        }

        self.at_line_start = line.bytes.ends_with(b"\n");
        let before = field.size();
        field.append(line.bytes, self.config.get_max_field_size())?;
        self.add_to_total(field.size() - before)?;
        self.state = State::StreamingField(field);
        Ok(Step::Continue)
    }

    async fn stream_file(&mut self, mut upload: FileUpload) -> Result<Step, MultipartError> {
        let Some(line) = self.scanner.read_line(false).await? else {
            return Err(MultipartError::UnexpectedEof);
        };
        let marker = if self.at_line_start && !line.truncated {
            self.markers.classify(line.bytes)
        } else {
            None
        };
        if let Some(marker) = marker {
            self.state = state_after(marker);
            return Ok(Step::Emit(upload.finish()));
        }

        self.at_line_start = line.bytes.ends_with(b"\n");
        let before = upload.size();
        upload.append(line.bytes, &self.config, &mut self.spill)?;
        self.add_to_total(upload.size() - before)?;
        self.state = State::StreamingFile(upload);
        Ok(Step::Continue)
    }

    fn add_to_total(&mut self, bytes: usize) -> Result<(), MultipartError> {
        let next_total = self.total_size.saturating_add(bytes);
        if next_total > self.config.get_max_total_size() {
            return Err(MultipartError::TotalTooLarge {
                size: next_total,
                max: self.config.get_max_total_size(),
            });
        }
        self.total_size = next_total;
        Ok(())
    }
}

impl<R> MultipartDecoder<AsyncSource<R>>
where
    AsyncSource<R>: ByteSource,
{
    /// Create a decoder reading from an async reader such as a request body.
    pub fn from_reader(
        content_type: &str,
        reader: R,
        config: DecoderConfig,
    ) -> Result<Self, MultipartError> {
        Self::new(content_type, AsyncSource::new(reader), config)
    }
}

fn log_outcome(outcome: &PartOutcome) {
    match outcome {
        PartOutcome::Ready {
            name,
            value: PartValue::Field(text),
        } => tracing::debug!(part = %name, kind = "field", size = text.len(), "multipart part decoded"),
        PartOutcome::Ready {
            name,
            value: PartValue::File(file),
        } => tracing::debug!(
            part = %name,
            kind = "file",
            size = file.size(),
            on_disk = file.is_on_disk(),
            "multipart part decoded"
        ),
        PartOutcome::Skipped { name, reason } => {
            tracing::debug!(part = %name, reason = %reason, "multipart part skipped");
        }
    }
}

/// Parts of a multipart body, yielded in input order.
///
/// Returned by [`MultipartDecoder::parts`]. After an error or the final
/// boundary, every call returns `None`.
#[derive(Debug)]
pub struct PartStream<'a, S> {
    decoder: &'a mut MultipartDecoder<S>,
}

impl<S: ByteSource> PartStream<'_, S> {
    /// The next decoded part, skipping attachments that could not be written.
    pub async fn next_part(&mut self) -> Option<Result<(String, PartValue), MultipartError>> {
        loop {
            match self.decoder.next_outcome().await {
                Ok(Some(PartOutcome::Ready { name, value })) => return Some(Ok((name, value))),
                Ok(Some(PartOutcome::Skipped { .. })) => {}
                Ok(None) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }

    /// The next part's outcome, including skipped attachments.
    pub async fn next_outcome(&mut self) -> Option<Result<PartOutcome, MultipartError>> {
        self.decoder.next_outcome().await.transpose()
    }

    /// The decoder this stream reads from.
    #[must_use]
    pub fn decoder(&self) -> &MultipartDecoder<S> {
        &*self.decoder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::Storage;
    use formspill_io::testing::ChunkedSource;
    use futures_executor::block_on;

    const CT: &str = "multipart/form-data; boundary=----boundary";

    fn decode(body: &[u8], config: DecoderConfig) -> Result<Form, MultipartError> {
        let mut decoder = MultipartDecoder::new(CT, body, config)?;
        block_on(decoder.read_all())
    }

    fn memory() -> DecoderConfig {
        DecoderConfig::new().max_in_memory_size(1024)
    }

    #[test]
    fn simple_form_fields() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"field1\"\r\n",
            "\r\n",
            "value1\r\n",
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"field2\"\r\n",
            "\r\n",
            "value2\r\n",
            "------boundary--\r\n"
        );

        let form = decode(body.as_bytes(), memory()).unwrap();
        assert_eq!(form.fields().len(), 2);
        assert_eq!(form.field("field1"), Some("value1"));
        assert_eq!(form.field("field2"), Some("value2"));
        assert!(form.files().is_empty());
    }

    #[test]
    fn file_upload_in_memory() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"test.txt\"\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "Hello, World!\r\n",
            "------boundary--\r\n"
        );

        let form = decode(body.as_bytes(), memory()).unwrap();
        let file = form.file("file").unwrap();
        assert_eq!(file.filename.as_deref(), Some("test.txt"));
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(file.storage, Storage::InMemory(b"Hello, World!".to_vec()));
    }

    #[test]
    fn preamble_is_ignored() {
        let body = concat!(
            "This is the preamble.\r\n",
            "It can span lines and mention ------boundaryish text.\r\n",
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"a\"\r\n",
            "\r\n",
            "1\r\n",
            "------boundary--\r\n",
            "epilogue is ignored too\r\n"
        );
        let form = decode(body.as_bytes(), memory()).unwrap();
        assert_eq!(form.field("a"), Some("1"));
    }

    #[test]
    fn empty_body_has_no_parts() {
        let form = decode(b"------boundary--\r\n", memory()).unwrap();
        assert!(form.is_empty());

        let err = decode(b"", memory()).unwrap_err();
        assert!(matches!(err, MultipartError::BoundaryNotFound));
        let err = decode(b"no boundary here\r\n", memory()).unwrap_err();
        assert!(matches!(err, MultipartError::BoundaryNotFound));
    }

    #[test]
    fn multi_line_field_joined_with_newline() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"notes\"\r\n",
            "\r\n",
            "line one\r\n",
            "line two\r\n",
            "\r\n",
            "------boundary--\r\n"
        );
        let form = decode(body.as_bytes(), memory()).unwrap();
        assert_eq!(form.field("notes"), Some("line one\nline two\n"));
    }

    #[test]
    fn boundary_with_trailing_whitespace() {
        let body = concat!(
            "------boundary  \r\n",
            "Content-Disposition: form-data; name=\"a\"\r\n",
            "\r\n",
            "x\r\n",
            "------boundary--\t\r\n"
        );
        let form = decode(body.as_bytes(), memory()).unwrap();
        assert_eq!(form.field("a"), Some("x"));
    }

    #[test]
    fn final_boundary_without_line_break() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"a\"\r\n",
            "\r\n",
            "x\r\n",
            "------boundary--"
        );
        let form = decode(body.as_bytes(), memory()).unwrap();
        assert_eq!(form.field("a"), Some("x"));
    }

    #[test]
    fn missing_content_disposition() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "x\r\n",
            "------boundary--\r\n"
        );
        let err = decode(body.as_bytes(), memory()).unwrap_err();
        assert!(matches!(err, MultipartError::MissingContentDisposition));
    }

    #[test]
    fn unexpected_eof_in_part() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"a\"\r\n",
            "\r\n",
            "truncated"
        );
        let err = decode(body.as_bytes(), memory()).unwrap_err();
        assert!(matches!(err, MultipartError::UnexpectedEof));

        let body = "------boundary\r\nContent-Disposition: form-data; name=\"a\"";
        let err = decode(body.as_bytes(), memory()).unwrap_err();
        assert!(matches!(err, MultipartError::UnexpectedEof));
    }

    #[test]
    fn header_line_longer_than_buffer() {
        let body = format!(
            "------boundary\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\nx\r\n------boundary--\r\n",
            "n".repeat(200)
        );
        let err = decode(body.as_bytes(), memory().buffer_size(64)).unwrap_err();
        assert!(matches!(err, MultipartError::InvalidPartHeaders { .. }));
    }

    #[test]
    fn invalid_utf8_field() {
        let mut body = b"------boundary\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n".to_vec();
        body.extend_from_slice(&[0xc3, 0x28, b'\r', b'\n']);
        body.extend_from_slice(b"------boundary--\r\n");
        let err = decode(&body, memory()).unwrap_err();
        assert!(matches!(err, MultipartError::InvalidUtf8 { ref name } if name == "a"));
    }

    #[test]
    fn field_and_total_limits() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"a\"\r\n",
            "\r\n",
            "0123456789\r\n",
            "------boundary--\r\n"
        );
        let err = decode(body.as_bytes(), memory().max_field_size(9)).unwrap_err();
        assert!(matches!(err, MultipartError::FieldTooLarge { size: 10, max: 9, .. }));

        let err = decode(body.as_bytes(), memory().max_total_size(5)).unwrap_err();
        assert!(matches!(err, MultipartError::TotalTooLarge { size: 10, max: 5 }));
        assert_eq!(err.status_code(), 413);

        assert!(decode(body.as_bytes(), memory().max_field_size(10)).is_ok());
    }

    #[test]
    fn too_many_parts() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"a\"\r\n",
            "\r\n",
            "1\r\n",
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"b\"\r\n",
            "\r\n",
            "2\r\n",
            "------boundary--\r\n"
        );
        let err = decode(body.as_bytes(), memory().max_parts(1)).unwrap_err();
        assert!(matches!(err, MultipartError::TooManyParts { count: 2, max: 1 }));
    }

    #[test]
    fn construction_errors() {
        let err = MultipartDecoder::new("multipart/form-data", &b""[..], memory()).err();
        assert!(matches!(err, Some(MultipartError::MissingBoundary)));

        let err = MultipartDecoder::new("text/plain; boundary=x", &b""[..], memory()).err();
        assert!(matches!(err, Some(MultipartError::InvalidBoundary)));

        let err = MultipartDecoder::new(CT, &b""[..], memory().buffer_size(8)).err();
        assert!(matches!(err, Some(MultipartError::InvalidConfig { .. })));

        // "------boundary--\r\n" is 18 bytes.
        let err = MultipartDecoder::new(CT, &b""[..], memory().buffer_size(17)).err();
        assert!(matches!(err, Some(MultipartError::InvalidConfig { .. })));
        assert!(MultipartDecoder::new(CT, &b""[..], memory().buffer_size(18)).is_ok());
    }

    #[test]
    fn second_read_is_rejected() {
        let body = b"------boundary--\r\n";
        let mut decoder = MultipartDecoder::new(CT, &body[..], memory()).unwrap();
        assert_eq!(decoder.boundary(), "----boundary");
        block_on(decoder.read_all()).unwrap();
        assert!(decoder.is_done());
        assert!(matches!(
            block_on(decoder.read_all()),
            Err(MultipartError::AlreadyReading)
        ));
        assert!(matches!(
            decoder.parts().err(),
            Some(MultipartError::AlreadyReading)
        ));
    }

    #[test]
    fn part_stream_yields_in_order() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"first\"\r\n",
            "\r\n",
            "1\r\n",
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "file body\r\n",
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"first\"\r\n",
            "\r\n",
            "2\r\n",
            "------boundary--\r\n"
        );
        let source = ChunkedSource::new(body.as_bytes(), 5);
        let mut decoder = MultipartDecoder::new(CT, source, memory()).unwrap();
        let mut parts = decoder.parts().unwrap();

        let (name, value) = block_on(parts.next_part()).unwrap().unwrap();
        assert_eq!((name.as_str(), value.as_text()), ("first", Some("1")));

        let (name, value) = block_on(parts.next_part()).unwrap().unwrap();
        assert_eq!(name, "upload");
        assert_eq!(value.into_file().unwrap().bytes().unwrap(), b"file body");

        let (name, value) = block_on(parts.next_part()).unwrap().unwrap();
        assert_eq!((name.as_str(), value.as_text()), ("first", Some("2")));

        assert!(block_on(parts.next_part()).is_none());
        assert!(block_on(parts.next_part()).is_none());
        assert_eq!(parts.decoder().parts_read(), 3);
    }

    #[test]
    fn part_stream_stops_after_error() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"ok\"\r\n",
            "\r\n",
            "fine\r\n",
            "------boundary\r\n",
            "\r\n",
            "no disposition\r\n",
            "------boundary--\r\n"
        );
        let mut decoder = MultipartDecoder::new(CT, body.as_bytes(), memory()).unwrap();
        let mut parts = decoder.parts().unwrap();
        assert!(block_on(parts.next_part()).unwrap().is_ok());
        assert!(matches!(
            block_on(parts.next_part()),
            Some(Err(MultipartError::MissingContentDisposition))
        ));
        assert!(block_on(parts.next_part()).is_none());
    }

    #[test]
    fn unsupported_content_type_is_rejected() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"f\"; filename=\"x.mys\"\r\n",
            "Content-Type: application/x-mystery\r\n",
            "\r\n",
            "data\r\n",
            "------boundary--\r\n"
        );
        let err = decode(body.as_bytes(), memory()).unwrap_err();
        assert!(matches!(err, MultipartError::UnsupportedContentType { .. }));

        let form = decode(body.as_bytes(), memory().extension("application/x-mystery", "mys")).unwrap();
        assert_eq!(form.file("f").unwrap().bytes().unwrap(), b"data");
    }

    #[test]
    fn boundary_text_inside_line_is_payload() {
        let body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"f\"; filename=\"a.txt\"\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "prefix ------boundary\r\n",
            "------boundary-- not final\r\n",
            "------boundary--\r\n"
        );
        let form = decode(body.as_bytes(), memory()).unwrap();
        assert_eq!(
            form.file("f").unwrap().bytes().unwrap(),
            b"prefix ------boundary\r\n------boundary-- not final"
        );
    }

    #[test]
    fn long_line_starting_like_boundary_is_payload() {
        let mut payload = b"------boundary".to_vec();
        payload.extend_from_slice(&[b' '; 100]);
        payload.extend_from_slice(b"tail");

        let mut body = concat!(
            "------boundary\r\n",
            "Content-Disposition: form-data; name=\"f\"; filename=\"a.txt\"\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n"
        )
        .as_bytes()
        .to_vec();
        body.extend_from_slice(&payload);
        body.extend_from_slice(b"\r\n------boundary--\r\n");

        for buffer_size in [64, 80, crate::config::DEFAULT_BUFFER_SIZE] {
            for chunk in [3, 64, body.len()] {
                let source = ChunkedSource::new(body.clone(), chunk);
                let mut decoder =
                    MultipartDecoder::new(CT, source, memory().buffer_size(buffer_size)).unwrap();
                let form = block_on(decoder.read_all()).unwrap();
                let file = form.file("f").unwrap();
                assert_eq!(file.size(), 118, "buffer {buffer_size}, chunk {chunk}");
                assert_eq!(file.bytes().unwrap(), payload);
            }
        }
    }

    #[test]
    fn decoder_and_stream_are_debug() {
        let mut decoder = MultipartDecoder::new(CT, &b"------boundary--\r\n"[..], memory()).unwrap();
        let rendered = format!("{decoder:?}");
        assert!(rendered.starts_with("MultipartDecoder"));
        assert!(rendered.contains("----boundary"));

        let parts = decoder.parts().unwrap();
        assert!(format!("{parts:?}").starts_with("PartStream"));
    }
}

//! Boundary and per-part header parsing.

use crate::error::MultipartError;

/// RFC 2046 recommends multipart boundary length <= 70 characters.
pub const MAX_BOUNDARY_LEN: usize = 70;

/// Maximum number of header lines accepted for a single part.
pub const MAX_PART_HEADERS: usize = 32;

/// Parse boundary from Content-Type header.
///
/// Content-Type format: `multipart/form-data; boundary=----WebKitFormBoundary...`
///
/// The parameter name is matched case-insensitively and the value may be
/// quoted, with backslash escapes.
pub fn parse_boundary(content_type: &str) -> Result<String, MultipartError> {
    let content_type = content_type.trim();
    let (main, params) = content_type.split_once(';').unwrap_or((content_type, ""));
    if !main.trim().eq_ignore_ascii_case("multipart/form-data") {
        return Err(MultipartError::InvalidBoundary);
    }

    let params = parse_params(params).map_err(|_| MultipartError::InvalidBoundary)?;
    let boundary = params
        .into_iter()
        .find(|(key, _)| key == "boundary")
        .map(|(_, value)| value)
        .ok_or(MultipartError::MissingBoundary)?;

    if !is_valid_boundary(&boundary) {
        return Err(MultipartError::InvalidBoundary);
    }
    Ok(boundary)
}

// RFC 2046 bchars; space is allowed anywhere but at the end.
fn is_valid_boundary(boundary: &str) -> bool {
    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN || boundary.ends_with(' ') {
        return false;
    }
    boundary.bytes().all(|b| {
        b.is_ascii_alphanumeric()
            || matches!(
                b,
                b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?' | b' '
            )
    })
}

/// Name and optional filename from a part's `Content-Disposition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    pub name: String,
    pub filename: Option<String>,
}

/// Parse Content-Disposition header value.
///
/// Format: `form-data; name="field"; filename="file.txt"`
pub fn parse_content_disposition(value: &str) -> Result<Disposition, MultipartError> {
    let value = value.trim();
    let Some((kind, params)) = value.split_once(';') else {
        return Err(MultipartError::invalid_disposition(
            "expected form-data with parameters",
        ));
    };
    if !kind.trim().eq_ignore_ascii_case("form-data") {
        return Err(MultipartError::invalid_disposition(format!(
            "unsupported disposition type {:?}",
            kind.trim()
        )));
    }

    let mut name = None;
    let mut filename = None;
    for (key, value) in parse_params(params).map_err(MultipartError::invalid_disposition)? {
        match key.as_str() {
            "name" => name = Some(value),
            "filename" => {
                if value.contains("..")
                    || value.contains('/')
                    || value.contains('\\')
                    || value.contains('\0')
                {
                    return Err(MultipartError::invalid_disposition(
                        "filename contains path traversal characters",
                    ));
                }
                filename = Some(value);
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| MultipartError::invalid_disposition("missing name parameter"))?;
    Ok(Disposition { name, filename })
}

/// Split `; key=value; key="quoted value"` into lower-cased keys and
/// unquoted values. Parameters without `=` are ignored.
fn parse_params(mut rest: &str) -> Result<Vec<(String, String)>, &'static str> {
    let mut params = Vec::new();
    loop {
        rest = rest.trim_start_matches([' ', '\t', ';']);
        if rest.is_empty() {
            return Ok(params);
        }

        let Some(eq) = rest.find(['=', ';']).filter(|&i| rest.as_bytes()[i] == b'=') else {
            let end = rest.find(';').unwrap_or(rest.len());
            rest = &rest[end..];
            continue;
        };
        let key = rest[..eq].trim().to_ascii_lowercase();
        rest = rest[eq + 1..].trim_start();

        let value = if rest.starts_with('"') {
            let (value, consumed) = unquote_prefix(rest)?;
            rest = &rest[consumed..];
            value
        } else {
            let end = rest.find(';').unwrap_or(rest.len());
            let value = rest[..end].trim().to_string();
            rest = &rest[end..];
            value
        };
        params.push((key, value));
    }
}

/// Read a quoted string at the start of `s`, reversing backslash escapes.
///
/// Returns the unquoted value and the number of bytes consumed, including
/// both quotes.
fn unquote_prefix(s: &str) -> Result<(String, usize), &'static str> {
    let mut value = String::new();
    let mut chars = s.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, i + 1)),
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c => value.push(c),
        }
    }
    Err("unterminated quoted string")
}

/// Header lines of one part, names lower-cased, in arrival order.
#[derive(Debug, Default)]
pub(crate) struct PartHeaders {
    entries: Vec<(String, String)>,
}

impl PartHeaders {
    /// Parse one `Name: value` line. Lines without a colon are ignored.
    pub(crate) fn push_line(&mut self, line: &[u8]) -> Result<(), MultipartError> {
        let line = std::str::from_utf8(line)
            .map_err(|_| MultipartError::invalid_headers("invalid UTF-8 in header"))?;
        if let Some((name, value)) = line.split_once(':') {
            if self.entries.len() == MAX_PART_HEADERS {
                return Err(MultipartError::invalid_headers(format!(
                    "more than {MAX_PART_HEADERS} headers in part"
                )));
            }
            self.entries
                .push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
        Ok(())
    }

    /// First value for `name` (lower-case).
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Which boundary line was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    /// `--boundary`: another part follows.
    Part,
    /// `--boundary--`: the body is complete.
    Final,
}

/// Boundary lines derived from the boundary string.
#[derive(Debug, Clone)]
pub(crate) struct Markers {
    part: Vec<u8>,
    last: Vec<u8>,
}

impl Markers {
    pub(crate) fn new(boundary: &str) -> Self {
        let mut part = Vec::with_capacity(boundary.len() + 2);
        part.extend_from_slice(b"--");
        part.extend_from_slice(boundary.as_bytes());
        let mut last = part.clone();
        last.extend_from_slice(b"--");
        Self { part, last }
    }

    /// Length of the longest boundary line, including its CRLF.
    pub(crate) fn line_len(&self) -> usize {
        self.last.len() + 2
    }

    /// Match a raw line (terminator included) against both markers.
    pub(crate) fn classify(&self, line: &[u8]) -> Option<Marker> {
        let trimmed = formspill_io::trim_trailing_whitespace(line);
        if trimmed == self.part.as_slice() {
            Some(Marker::Part)
        } else if trimmed == self.last.as_slice() {
            Some(Marker::Final)
        } else {
            None
        }
    }
}

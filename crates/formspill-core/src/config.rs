//! Decoder configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::MultipartError;
use crate::media::essence;

/// Default scanner buffer size (1MB).
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Default maximum file size (10MB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Default in-memory ceiling: every attachment goes straight to disk.
pub const DEFAULT_MAX_IN_MEMORY_SIZE: usize = 0;

/// Default maximum text field size (1MB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 1024 * 1024;

/// Default maximum total upload size (50MB).
pub const DEFAULT_MAX_TOTAL_SIZE: usize = 50 * 1024 * 1024;

/// Default maximum number of parts.
pub const DEFAULT_MAX_PARTS: usize = 100;

/// Configuration for multipart decoding.
///
/// Built with chained setters, or deserialized from an application config
/// file where every field is optional:
///
/// ```
/// use formspill_core::DecoderConfig;
///
/// let config = DecoderConfig::from_json(r#"{ "max_file_size": 2048, "filename_prefix": "up-" }"#)
///     .unwrap();
/// assert_eq!(config.get_max_file_size(), 2048);
/// assert_eq!(config.get_filename_prefix(), "up-");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    /// Scanner buffer size in bytes; also the longest header line accepted.
    buffer_size: usize,
    /// Maximum size per file in bytes.
    max_file_size: usize,
    /// Attachments up to this size stay in memory; 0 spills every one.
    max_in_memory_size: usize,
    /// Where spilled attachments are written. `None` uses a fresh
    /// directory under the system temp dir, created on first spill.
    output_dir: Option<PathBuf>,
    /// Prepended to every spilled file name.
    filename_prefix: String,
    /// Content type to extension overrides, consulted before the built-in table.
    extensions: HashMap<String, String>,
    /// Maximum size per text field in bytes.
    max_field_size: usize,
    /// Maximum total upload size in bytes.
    max_total_size: usize,
    /// Maximum number of parts (fields and files).
    max_parts: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_in_memory_size: DEFAULT_MAX_IN_MEMORY_SIZE,
            output_dir: None,
            filename_prefix: String::new(),
            extensions: HashMap::new(),
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_total_size: DEFAULT_MAX_TOTAL_SIZE,
            max_parts: DEFAULT_MAX_PARTS,
        }
    }
}

impl DecoderConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, MultipartError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MultipartError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the scanner buffer size.
    #[must_use]
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the maximum file size.
    #[must_use]
    pub fn max_file_size(mut self, size: usize) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set the size up to which attachments are kept in memory.
    #[must_use]
    pub fn max_in_memory_size(mut self, size: usize) -> Self {
        self.max_in_memory_size = size;
        self
    }

    /// Set the directory spilled attachments are written to.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the prefix for spilled file names.
    #[must_use]
    pub fn filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    /// Map a content type to a file extension, overriding the built-in table.
    #[must_use]
    pub fn extension(mut self, content_type: &str, ext: &str) -> Self {
        self.extensions.insert(essence(content_type), ext.to_string());
        self
    }

    /// Set the maximum text field size.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Set the maximum total upload size.
    #[must_use]
    pub fn max_total_size(mut self, size: usize) -> Self {
        self.max_total_size = size;
        self
    }

    /// Set the maximum number of parts.
    #[must_use]
    pub fn max_parts(mut self, count: usize) -> Self {
        self.max_parts = count;
        self
    }

    /// Get the scanner buffer size.
    #[must_use]
    pub fn get_buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Get the maximum file size.
    #[must_use]
    pub fn get_max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Get the in-memory ceiling.
    #[must_use]
    pub fn get_max_in_memory_size(&self) -> usize {
        self.max_in_memory_size
    }

    /// Get the configured output directory, if any.
    #[must_use]
    pub fn get_output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Get the spilled file name prefix.
    #[must_use]
    pub fn get_filename_prefix(&self) -> &str {
        &self.filename_prefix
    }

    /// Get the custom extension table.
    #[must_use]
    pub fn get_extensions(&self) -> &HashMap<String, String> {
        &self.extensions
    }

    /// Get the maximum text field size.
    #[must_use]
    pub fn get_max_field_size(&self) -> usize {
        self.max_field_size
    }

    /// Get the maximum total upload size.
    #[must_use]
    pub fn get_max_total_size(&self) -> usize {
        self.max_total_size
    }

    /// Get the maximum number of parts.
    #[must_use]
    pub fn get_max_parts(&self) -> usize {
        self.max_parts
    }

    /// Check the configuration for values the decoder cannot work with.
    pub fn validate(&self) -> Result<(), MultipartError> {
        if self.buffer_size < formspill_io::MIN_CAPACITY {
            return Err(MultipartError::invalid_config(format!(
                "buffer_size must be at least {} bytes",
                formspill_io::MIN_CAPACITY
            )));
        }
        if self
            .output_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(MultipartError::invalid_config("output_dir is empty"));
        }
        if !is_plain_file_name(&self.filename_prefix) {
            return Err(MultipartError::invalid_config(
                "filename_prefix must not contain path separators",
            ));
        }
        for (content_type, ext) in &self.extensions {
            let ext = ext.trim_start_matches('.');
            if ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(MultipartError::invalid_config(format!(
                    "invalid extension {ext:?} for {content_type}"
                )));
            }
        }
        Ok(())
    }

    /// Validate, then canonicalize the extension table for lookup.
    pub(crate) fn prepared(mut self) -> Result<Self, MultipartError> {
        self.validate()?;
        self.extensions = self
            .extensions
            .into_iter()
            .map(|(content_type, ext)| {
                (
                    essence(&content_type),
                    ext.trim_start_matches('.').to_ascii_lowercase(),
                )
            })
            .collect();
        Ok(self)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DecoderConfig::new();
        assert_eq!(config.get_buffer_size(), 1024 * 1024);
        assert_eq!(config.get_max_file_size(), 10 * 1024 * 1024);
        assert_eq!(config.get_max_in_memory_size(), 0);
        assert_eq!(config.get_output_dir(), None);
        assert_eq!(config.get_filename_prefix(), "");
        assert!(config.get_extensions().is_empty());
        assert_eq!(config.get_max_field_size(), 1024 * 1024);
        assert_eq!(config.get_max_total_size(), 50 * 1024 * 1024);
        assert_eq!(config.get_max_parts(), 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_sets_values() {
        let config = DecoderConfig::new()
            .buffer_size(64)
            .max_file_size(1000)
            .max_in_memory_size(10)
            .output_dir("/tmp/uploads")
            .filename_prefix("up-")
            .extension("Application/X-Thing; v=1", "thing")
            .max_field_size(5)
            .max_total_size(2000)
            .max_parts(3);
        assert_eq!(config.get_buffer_size(), 64);
        assert_eq!(config.get_max_file_size(), 1000);
        assert_eq!(config.get_max_in_memory_size(), 10);
        assert_eq!(config.get_output_dir(), Some(Path::new("/tmp/uploads")));
        assert_eq!(config.get_filename_prefix(), "up-");
        assert_eq!(
            config.get_extensions().get("application/x-thing").map(String::as_str),
            Some("thing")
        );
        assert_eq!(config.get_max_field_size(), 5);
        assert_eq!(config.get_max_total_size(), 2000);
        assert_eq!(config.get_max_parts(), 3);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(DecoderConfig::new().buffer_size(15).validate().is_err());
        assert!(DecoderConfig::new().buffer_size(16).validate().is_ok());
        assert!(DecoderConfig::new().output_dir("").validate().is_err());
        assert!(DecoderConfig::new().filename_prefix("../x").validate().is_err());
        assert!(DecoderConfig::new().filename_prefix("a/b").validate().is_err());
        assert!(DecoderConfig::new().extension("image/png", "").validate().is_err());
        assert!(DecoderConfig::new().extension("image/png", "p/g").validate().is_err());

        let err = DecoderConfig::new().buffer_size(1).validate().unwrap_err();
        assert!(matches!(err, MultipartError::InvalidConfig { .. }));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn prepared_normalizes_extensions() {
        let json = r#"{ "extensions": { "Image/X-Raw; q=1": ".RAW" } }"#;
        let config = DecoderConfig::from_json(json).unwrap().prepared().unwrap();
        assert_eq!(
            config.get_extensions().get("image/x-raw").map(String::as_str),
            Some("raw")
        );
    }

    #[test]
    fn from_json_partial() {
        let config = DecoderConfig::from_json(
            r#"{ "buffer_size": 4096, "output_dir": "/var/spool/forms", "max_parts": 7 }"#,
        )
        .unwrap();
        assert_eq!(config.get_buffer_size(), 4096);
        assert_eq!(config.get_output_dir(), Some(Path::new("/var/spool/forms")));
        assert_eq!(config.get_max_parts(), 7);
        assert_eq!(config.get_max_file_size(), DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn from_json_errors() {
        assert!(matches!(
            DecoderConfig::from_json(r#"{ "buffer_sise": 4096 }"#),
            Err(MultipartError::InvalidConfig { .. })
        ));
        assert!(matches!(
            DecoderConfig::from_json(r#"{ "buffer_size": 2 }"#),
            Err(MultipartError::InvalidConfig { .. })
        ));
        assert!(DecoderConfig::from_json("not json").is_err());
    }
}

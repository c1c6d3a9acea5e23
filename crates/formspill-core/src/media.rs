//! Content-type to file-extension resolution for spilled attachments.

use std::collections::HashMap;

use crate::error::MultipartError;

/// Normalize a content type for lookup: parameters dropped, lower-cased.
///
/// `Image/PNG; q=1` becomes `image/png`.
#[must_use]
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Built-in extension for a normalized content type.
#[must_use]
pub fn builtin_extension(essence: &str) -> Option<&'static str> {
    let ext = match essence {
        // Text
        "text/html" => "html",
        "text/css" => "css",
        "text/javascript" | "application/javascript" => "js",
        "application/json" => "json",
        "application/xml" | "text/xml" => "xml",
        "text/plain" => "txt",
        "text/csv" => "csv",
        "text/markdown" => "md",

        // Images
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        "image/bmp" => "bmp",
        "image/avif" => "avif",
        "image/tiff" => "tiff",

        // Fonts
        "font/woff" => "woff",
        "font/woff2" => "woff2",
        "font/ttf" => "ttf",
        "font/otf" => "otf",

        // Audio
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/flac" => "flac",
        "audio/aac" => "aac",
        "audio/mp4" => "m4a",

        // Video
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/x-msvideo" => "avi",
        "video/quicktime" => "mov",
        "video/x-matroska" => "mkv",

        // Documents
        "application/pdf" => "pdf",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.ms-powerpoint" => "ppt",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",

        // Archives
        "application/zip" => "zip",
        "application/gzip" | "application/x-gzip" => "gz",
        "application/x-tar" => "tar",
        "application/x-7z-compressed" => "7z",

        // Binary
        "application/octet-stream" => "bin",
        "application/wasm" => "wasm",

        _ => return None,
    };
    Some(ext)
}

/// Resolve the extension for an attachment's declared content type.
///
/// `custom` is consulted first (keys already normalized with [`essence`]),
/// then the built-in table.
pub fn resolve_extension(
    content_type: &str,
    custom: &HashMap<String, String>,
) -> Result<String, MultipartError> {
    let key = essence(content_type);
    if let Some(ext) = custom.get(&key) {
        return Ok(ext.clone());
    }
    builtin_extension(&key)
        .map(str::to_string)
        .ok_or_else(|| MultipartError::UnsupportedContentType {
            content_type: content_type.trim().to_string(),
        })
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::Path;

/// Fallback media type for unrecognized extensions.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Derive a media type from a path's extension via a fixed table.
///
/// The table covers the common static-site asset set and falls back to
/// [`DEFAULT_MEDIA_TYPE`] for anything it doesn't recognize.
pub fn media_type_for(path: &Path) -> String {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let mime = match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "wasm" => "application/wasm",
        _ => DEFAULT_MEDIA_TYPE,
    };
    mime.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn known_extensions_map_to_their_mime_type() {
        assert_eq!(media_type_for(&PathBuf::from("index.html")), "text/html");
        assert_eq!(media_type_for(&PathBuf::from("app.js")), "text/javascript");
        assert_eq!(media_type_for(&PathBuf::from("logo.SVG")), "image/svg+xml");
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(media_type_for(&PathBuf::from("data.xyz")), DEFAULT_MEDIA_TYPE);
        assert_eq!(media_type_for(&PathBuf::from("noext")), DEFAULT_MEDIA_TYPE);
    }
}

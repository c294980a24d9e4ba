// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use crate::record::Record;

/// A single file, local or remote.
///
/// Invariants (enforced by constructors, not re-checked on every field
/// access): `path` always begins with `/` and uses forward slashes;
/// `content` is populated only when the entry is about to be uploaded;
/// `source_record` is populated only for entries built from a remote
/// announcement (needed to build deletion records during purge).
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: String,
    pub size: u64,
    pub hash: String,
    pub media_type: String,
    pub content: Option<Vec<u8>>,
    pub source_record: Option<Record>,
}

impl FileEntry {
    /// Build a local entry discovered by the walker. No source record: it
    /// did not come from a relay.
    pub fn local(path: impl Into<String>, size: u64, hash: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            path: normalize_path(path.into()),
            size,
            hash: hash.into(),
            media_type: media_type.into(),
            content: None,
            source_record: None,
        }
    }

    /// Build an entry from a fetched remote announcement record. Size and
    /// media type come from the record's `size`/`m` tags when present;
    /// callers that only need `(path, hash)` for diffing may leave them at 0
    /// and `"application/octet-stream"`.
    pub fn remote(path: impl Into<String>, hash: impl Into<String>, size: u64, media_type: impl Into<String>, source_record: Record) -> Self {
        Self {
            path: normalize_path(path.into()),
            size,
            hash: hash.into(),
            media_type: media_type.into(),
            content: None,
            source_record: Some(source_record),
        }
    }

    pub fn with_content(mut self, bytes: Vec<u8>) -> Self {
        self.content = Some(bytes);
        self
    }
}

/// Normalize a path to the canonical form: leading `/`, forward slashes.
fn normalize_path(mut path: String) -> String {
    path = path.replace('\\', "/");
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_normalizes_missing_leading_slash() {
        let e = FileEntry::local("index.html", 10, "hash", "text/html");
        assert_eq!(e.path, "/index.html");
    }

    #[test]
    fn local_normalizes_backslashes() {
        let e = FileEntry::local("a\\b\\c.css", 1, "h", "text/css");
        assert_eq!(e.path, "/a/b/c.css");
    }

    #[test]
    fn local_keeps_existing_leading_slash() {
        let e = FileEntry::local("/a/b.css", 1, "h", "text/css");
        assert_eq!(e.path, "/a/b.css");
    }
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Hasher & Walker.
//!
//! Enumerates a directory tree, applies ignore patterns, hashes each
//! included file's content with SHA-256 (the digest blob servers use for
//! their `/<hash>` lookup URLs), and derives a media type from the path
//! extension.

mod ignore;
mod media_type;

pub use ignore::IgnoreSet;
pub use media_type::media_type_for;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use sitecaster_types::FileEntry;
use thiserror::Error;

/// Files under this size (bytes) have their content buffered during the
/// walk for reuse at upload time, instead of being re-read.
pub const SMALL_FILE_CACHE_THRESHOLD: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("io error reading ignore file {path}: {source}")]
    IgnoreFile { path: PathBuf, source: std::io::Error },
}

/// A path excluded from the walk, with the reason it was skipped.
#[derive(Debug, Clone)]
pub struct IgnoredPath {
    pub path: String,
    pub reason: String,
}

/// A per-file error encountered while walking. Recorded, not fatal.
#[derive(Debug, Clone)]
pub struct WalkFileError {
    pub path: String,
    pub error: String,
}

/// Result of walking a tree: included files, ignored paths, and per-file
/// errors. Ordering is stable lexicographic by path.
#[derive(Debug, Default)]
pub struct WalkResult {
    pub included: Vec<FileEntry>,
    pub ignored: Vec<IgnoredPath>,
    pub errors: Vec<WalkFileError>,
}

/// Walk `root`, applying `ignore_set`, hashing every included file.
pub fn walk(root: &Path, ignore_set: &IgnoreSet) -> WalkResult {
    let mut included = Vec::new();
    let mut ignored = Vec::new();
    let mut errors = Vec::new();
    let mut seen_inodes: std::collections::HashSet<(u64, u64)> = std::collections::HashSet::new();

    let walker = walkdir::WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| {
        let Ok(rel) = e.path().strip_prefix(root) else { return true };
        if rel.as_os_str().is_empty() || !e.file_type().is_dir() {
            return true;
        }
        // Directories matched by any pattern are pruned — descendants are
        // never scanned.
        !ignore_set.matches(rel, true)
    }) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                errors.push(WalkFileError { path: err.path().map(|p| p.display().to_string()).unwrap_or_default(), error: err.to_string() });
                continue;
            }
        };

        let rel = match entry.path().strip_prefix(root) {
            Ok(r) if !r.as_os_str().is_empty() => r,
            _ => continue,
        };

        if entry.file_type().is_dir() {
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        if ignore_set.matches(rel, false) {
            ignored.push(IgnoredPath { path: to_logical_path(rel), reason: "ignore pattern".into() });
            continue;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            if let Ok(meta) = entry.metadata() {
                let key = (meta.dev(), meta.ino());
                if !seen_inodes.insert(key) {
                    tracing::warn!(path = %rel.display(), "symlink loop detected, skipping");
                    continue;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = &seen_inodes;
        }

        match hash_file(entry.path()) {
            Ok((hash, size, content)) => {
                let media_type = media_type_for(entry.path());
                let mut file_entry = FileEntry::local(to_logical_path(rel), size, hash, media_type);
                if let Some(bytes) = content {
                    file_entry = file_entry.with_content(bytes);
                }
                included.push(file_entry);
            }
            Err(err) => {
                tracing::warn!(path = %rel.display(), error = %err, "failed to hash file, excluding from publish");
                errors.push(WalkFileError { path: to_logical_path(rel), error: err.to_string() });
            }
        }
    }

    included.sort_by(|a, b| a.path.cmp(&b.path));
    ignored.sort_by(|a, b| a.path.cmp(&b.path));
    errors.sort_by(|a, b| a.path.cmp(&b.path));

    WalkResult { included, ignored, errors }
}

/// Hash a file in a single streaming pass, returning its lowercase-hex
/// SHA-256 digest, its size, and — if it is small enough — its content for
/// reuse at upload time.
fn hash_file(path: &Path) -> std::io::Result<(String, u64, Option<Vec<u8>>)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut size: u64 = 0;
    let mut cached = Vec::new();
    let mut cache_ok = true;

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
        if cache_ok {
            if size > SMALL_FILE_CACHE_THRESHOLD {
                cache_ok = false;
                cached.clear();
                cached.shrink_to_fit();
            } else {
                cached.extend_from_slice(&buf[..n]);
            }
        }
    }

    let hash = hex::encode(hasher.finalize());
    Ok((hash, size, if cache_ok { Some(cached) } else { None }))
}

/// Re-read a file's bytes at upload time for entries whose content was not
/// cached during the walk.
pub fn read_file(path: &Path) -> std::io::Result<Vec<u8>> {
    std::fs::read(path)
}

fn to_logical_path(rel: &Path) -> String {
    let mut s = rel.to_string_lossy().replace('\\', "/");
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_and_hashes_a_small_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), b"<html></html>").unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/style.css"), b"body{}").unwrap();

        let result = walk(dir.path(), &IgnoreSet::empty());
        assert_eq!(result.included.len(), 2);
        assert_eq!(result.included[0].path, "/assets/style.css");
        assert_eq!(result.included[1].path, "/index.html");
        assert_eq!(result.included[1].media_type, "text/html");
        assert!(result.errors.is_empty());
    }

    #[test]
    fn same_content_hashes_identically() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"same bytes").unwrap();
        fs::write(dir.path().join("b.txt"), b"same bytes").unwrap();
        let result = walk(dir.path(), &IgnoreSet::empty());
        assert_eq!(result.included[0].hash, result.included[1].hash);
    }

    #[test]
    fn small_file_content_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        let result = walk(dir.path(), &IgnoreSet::empty());
        assert_eq!(result.included[0].content.as_deref(), Some(b"hello".as_slice()));
    }

    #[test]
    fn ignored_directory_is_pruned() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/lib.js"), b"x").unwrap();
        fs::write(dir.path().join("index.html"), b"y").unwrap();

        let ignore_set = IgnoreSet::parse("node_modules\n");
        let result = walk(dir.path(), &ignore_set);
        assert_eq!(result.included.len(), 1);
        assert_eq!(result.included[0].path, "/index.html");
    }
}

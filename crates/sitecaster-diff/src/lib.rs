// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! The differencing step.
//!
//! Pure function over two sets of [`FileEntry`]; no I/O, no async. Path is
//! the primary key, and content hash is the only thing compared to decide
//! the `unchanged` bucket — media type and size are ignored.

use std::collections::HashMap;

use sitecaster_types::{Diff, FileEntry};

/// Compute `(to_upload, unchanged, to_delete)` from a local and a remote set.
///
/// `local` and `remote` need not be sorted; the output sequences are sorted
/// lexicographically by path for deterministic, reviewable output.
pub fn compute(local: Vec<FileEntry>, remote: Vec<FileEntry>) -> Diff {
    let mut remote_by_path: HashMap<String, FileEntry> =
        remote.into_iter().map(|e| (e.path.clone(), e)).collect();

    let mut to_upload = Vec::new();
    let mut unchanged = Vec::new();
    let mut local_paths: std::collections::HashSet<String> = std::collections::HashSet::new();

    for entry in local {
        local_paths.insert(entry.path.clone());
        match remote_by_path.get(&entry.path) {
            Some(remote_entry) if remote_entry.hash == entry.hash => unchanged.push(entry),
            _ => to_upload.push(entry),
        }
    }

    // Whatever remains in `remote_by_path` has no local counterpart at all —
    // paths present locally but with a mismatched hash were already removed
    // from contention above by being routed to `to_upload`, and their remote
    // counterpart stays in the map (correctly excluded from `to_delete`)
    // because the membership rule is path-based, not path-and-hash.
    remote_by_path.retain(|path, _| !local_paths.contains(path));
    let mut to_delete: Vec<FileEntry> = remote_by_path.into_values().collect();

    to_upload.sort_by(|a, b| a.path.cmp(&b.path));
    unchanged.sort_by(|a, b| a.path.cmp(&b.path));
    to_delete.sort_by(|a, b| a.path.cmp(&b.path));

    Diff { to_upload, unchanged, to_delete }
}

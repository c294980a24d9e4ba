// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use crate::entry::FileEntry;

/// Output of the differencing step.
///
/// The three sequences are disjoint by construction: a path appears in
/// exactly one of them. Built by `sitecaster-diff`; kept here (rather than in
/// that crate) so every consumer of a diff can depend on `sitecaster-types`
/// alone.
#[derive(Debug, Default)]
pub struct Diff {
    pub to_upload: Vec<FileEntry>,
    pub unchanged: Vec<FileEntry>,
    pub to_delete: Vec<FileEntry>,
}

impl Diff {
    pub fn is_noop(&self) -> bool {
        self.to_upload.is_empty() && self.to_delete.is_empty()
    }
}

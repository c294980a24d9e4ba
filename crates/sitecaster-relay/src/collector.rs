// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! The message collector: a single append-only sink for
//! per-relay/per-file outcomes, shared across tasks behind a short-lived
//! lock. This is the only piece of cross-task mutable state in the
//! publishing core.

use std::sync::Arc;

use tokio::sync::Mutex;

/// What category of event a collector entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    RelayAccepted,
    RelayRejected,
    RelayRateLimited,
    RelayTimeout,
    RelayTransportError,
    RelayNotice,
    UploadSuccess,
    UploadFailure,
}

/// One recorded outcome: which category, which key (a relay URL or a
/// server URL), a human-readable message, and — for upload outcomes — the
/// file path the entry is about, so a grouped summary can list affected
/// paths rather than just server URLs.
#[derive(Debug, Clone)]
pub struct CollectorEntry {
    pub category: Category,
    pub key: String,
    pub message: String,
    pub path: Option<String>,
}

/// Shared sink for [`CollectorEntry`] values. Cheap to clone (wraps an
/// `Arc`); every publish/upload task gets its own clone and calls
/// [`MessageCollector::push`] without needing to coordinate with any other
/// task beyond the brief lock acquisition inside `push`.
#[derive(Clone, Default)]
pub struct MessageCollector {
    entries: Arc<Mutex<Vec<CollectorEntry>>>,
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, category: Category, key: impl Into<String>, message: impl Into<String>) {
        let entry = CollectorEntry { category, key: key.into(), message: message.into(), path: None };
        self.entries.lock().await.push(entry);
    }

    /// Like [`push`](Self::push), but records the file path the entry is
    /// about — used for upload outcomes, where the key is a server URL and
    /// path identity would otherwise be lost.
    pub async fn push_for_path(&self, category: Category, key: impl Into<String>, message: impl Into<String>, path: impl Into<String>) {
        let entry = CollectorEntry { category, key: key.into(), message: message.into(), path: Some(path.into()) };
        self.entries.lock().await.push(entry);
    }

    pub async fn snapshot(&self) -> Vec<CollectorEntry> {
        self.entries.lock().await.clone()
    }
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Human-readable (and machine-readable) summary of a publish run.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Affected-path-list cap for a non-verbose [`ErrorGroup`].
pub const ERROR_GROUP_PATH_LIMIT: usize = 3;

/// One group of errors/warnings sharing a (category, message) pair,
/// deduplicated from the relay and upload collectors, with the list of
/// affected paths truncated to [`ERROR_GROUP_PATH_LIMIT`] entries and the
/// remainder counted in `overflow`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorGroup {
    pub summary: String,
    pub affected_paths: Vec<String>,
    pub overflow: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub uploaded: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub noop: bool,
    pub ambiguous: bool,
    /// Count of successful (blob, server) stores, keyed by server URL.
    pub uploads_per_server: HashMap<String, usize>,
    /// Count of accepted publishes, keyed by relay URL.
    pub accepts_per_relay: HashMap<String, usize>,
    /// Human-readable error/warning groups gathered from the relay and
    /// upload collectors, each carrying a capped list of affected paths.
    pub error_groups: Vec<ErrorGroup>,
    /// The publisher's addressable gateway URL.
    pub gateway_url: String,
}

impl RunSummary {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("RunSummary always serializes")
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.noop {
            return writeln!(f, "nothing to do — remote already matches local tree");
        }
        writeln!(f, "published {} file(s), {} unchanged, {} deleted", self.uploaded, self.unchanged, self.deleted)?;
        if self.ambiguous {
            writeln!(f, "warning: remote state was ambiguous; proceeded anyway (force)")?;
        }
        for (server, count) in &self.uploads_per_server {
            writeln!(f, "  {server}: {count} blob(s) stored")?;
        }
        for (relay, count) in &self.accepts_per_relay {
            writeln!(f, "  {relay}: {count} record(s) accepted")?;
        }
        for group in &self.error_groups {
            write!(f, "  ! {}", group.summary)?;
            if !group.affected_paths.is_empty() {
                write!(f, " ({})", group.affected_paths.join(", "))?;
            }
            if group.overflow > 0 {
                write!(f, " and {} more", group.overflow)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "gateway: {}", self.gateway_url)
    }
}

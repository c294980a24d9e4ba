// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// Profile metadata published as a kind-0 record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Which optional metadata records to publish alongside file announcements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataFlags {
    #[serde(default)]
    pub publish_relay_list: bool,
    #[serde(default)]
    pub publish_server_list: bool,
    #[serde(default)]
    pub publish_profile: bool,
}

/// Typed configuration for one publish run.
///
/// This is the one boundary the core itself owns: an external CLI or wizard
/// builds a `PublishOptions` (by hand or via [`load`]) and hands it to
/// `sitecaster::publish::run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOptions {
    /// Local directory tree to publish.
    pub root: std::path::PathBuf,
    /// Relay WebSocket URLs (`wss://` or `ws://`).
    pub relays: Vec<String>,
    /// Blob server base URLs.
    pub servers: Vec<String>,
    /// Path to the ignore-pattern file, relative to `root` if not absolute.
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,
    /// Value of the `client` tag on announcement records.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Bounded upload parallelism.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Proceed with full re-upload despite an ambiguous remote state
    ///.
    #[serde(default)]
    pub force: bool,
    /// Delete server blobs / publish deletion records for remote-only paths.
    #[serde(default)]
    pub purge: bool,
    #[serde(default)]
    pub metadata: MetadataFlags,
    #[serde(default)]
    pub profile: Profile,
    /// Gateway host used to build the addressable URL in the run summary.
    #[serde(default = "default_gateway_host")]
    pub gateway_host: String,
}

fn default_ignore_file() -> String {
    ".sitecasterignore".to_string()
}

fn default_app_name() -> String {
    "sitecaster".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_gateway_host() -> String {
    "sitecaster.app".to_string()
}

impl PublishOptions {
    pub fn new(root: impl Into<std::path::PathBuf>, relays: Vec<String>, servers: Vec<String>) -> Self {
        Self {
            root: root.into(),
            relays,
            servers,
            ignore_file: default_ignore_file(),
            app_name: default_app_name(),
            concurrency: default_concurrency(),
            force: false,
            purge: false,
            metadata: MetadataFlags::default(),
            profile: Profile::default(),
            gateway_host: default_gateway_host(),
        }
    }
}

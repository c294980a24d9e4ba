// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Publish orchestrator: the one entry point the
//! external caller drives. Threads a single [`CancellationToken`] through
//! every phase so a caller can interrupt a run between (but not mid-) steps.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bech32::{Bech32, Hrp};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use sitecaster_config::PublishOptions;
use sitecaster_relay::{Category, MessageCollector};
use sitecaster_signer::Signer;
use sitecaster_types::{FileEntry, Record, RecordTemplate, Tag};
use sitecaster_walker::IgnoreSet;

use crate::error::PublishError;
use crate::summary::{ErrorGroup, RunSummary, ERROR_GROUP_PATH_LIMIT};

const DELETION_KIND: u32 = 5;
const RELAY_LIST_KIND: u32 = 10002;
const SERVER_LIST_KIND: u32 = 10063;
const PROFILE_KIND: u32 = 0;
const DELETION_EXPIRATION_SECS: i64 = 300;

/// Run one full publish cycle against `options`, signing with `signer` and
/// honoring `cancel` between phases.
pub async fn run(options: PublishOptions, signer: Arc<dyn Signer>, cancel: CancellationToken) -> Result<RunSummary, PublishError> {
    let pubkey = signer.public_key().await?;
    let gateway_url = gateway_url_for(&pubkey, &options.gateway_host)?;

    // Step 1: walk the local tree.
    let ignore_path = resolve_ignore_path(&options.root, &options.ignore_file);
    let ignore_set = IgnoreSet::load(&ignore_path).unwrap_or_else(|err| {
        warn!(path = %ignore_path.display(), %err, "failed to read ignore file, proceeding with none");
        IgnoreSet::empty()
    });
    let walked = sitecaster_walker::walk(&options.root, &ignore_set);
    info!(included = walked.included.len(), ignored = walked.ignored.len(), errors = walked.errors.len(), "walked local tree");
    for err in &walked.errors {
        warn!(path = %err.path, error = %err.error, "failed to read local file, excluding from publish");
    }

    if cancel.is_cancelled() {
        return Err(PublishError::Cancelled);
    }

    // Step 2: fetch the remote set.
    let fetch = sitecaster_relay::fetch_records(&options.relays, &pubkey).await;
    info!(records = fetch.records.len(), inconclusive = fetch.inconclusive, "fetched remote record set");
    let remote_entries: Vec<FileEntry> = fetch.records.iter().filter_map(|r| record_to_entry(r.clone())).collect();

    // Step 2b: ambiguity probe. An empty-and-inconclusive remote set could
    // mean "nothing published yet" or "every relay is unreachable while
    // blobs still sit on the servers" — probe to tell the two apart.
    let mut ambiguous = false;
    if remote_entries.is_empty() && fetch.inconclusive && !walked.included.is_empty() {
        let probe_hash = walked.included[0].hash.clone();
        let present_on = probe_servers_for_hash(&options.servers, &probe_hash).await;
        if present_on > 0 {
            ambiguous = true;
            if !options.force {
                return Err(PublishError::Ambiguous(present_on));
            }
            warn!(present_on, "remote state ambiguous, proceeding because force is set");
        }
    }

    if cancel.is_cancelled() {
        return Err(PublishError::Cancelled);
    }

    // Step 3: diff.
    let diff = sitecaster_diff::compute(walked.included, remote_entries);
    debug!(to_upload = diff.to_upload.len(), unchanged = diff.unchanged.len(), to_delete = diff.to_delete.len(), "computed diff");

    // Step 4: short-circuit on a true no-op.
    if diff.is_noop() && !options.force {
        return Ok(RunSummary { noop: true, unchanged: diff.unchanged.len(), gateway_url, ..Default::default() });
    }

    // Step 5: load content for entries the walker didn't cache.
    let mut to_upload = diff.to_upload;
    for entry in &mut to_upload {
        if entry.content.is_none() {
            let full_path = local_path_for(&options.root, &entry.path);
            let bytes = sitecaster_walker::read_file(&full_path)?;
            entry.content = Some(bytes);
        }
    }

    if cancel.is_cancelled() {
        return Err(PublishError::Cancelled);
    }

    // Step 6: upload, then announce every success.
    let http_client = reqwest::Client::new();
    let collector = MessageCollector::new();
    let outcomes = sitecaster_blobs::upload_all(&to_upload, &options.servers, signer.clone(), options.concurrency, &http_client, &cancel).await;

    let mut uploaded = 0usize;
    let by_path: HashMap<String, &FileEntry> = to_upload.iter().map(|e| (e.path.clone(), e)).collect();
    for outcome in &outcomes {
        for result in &outcome.server_results {
            let category = if result.success { Category::UploadSuccess } else { Category::UploadFailure };
            let message = result.error.clone().unwrap_or_else(|| "stored".to_string());
            collector.push_for_path(category, result.server.clone(), message, outcome.path.clone()).await;
        }
        if !outcome.stored() {
            error!(path = %outcome.path, "blob failed to store on every configured server");
            continue;
        }
        uploaded += 1;
        let Some(entry) = by_path.get(&outcome.path) else { continue };
        let record = sitecaster_blobs::build_announcement_record(signer.as_ref(), entry, &options.app_name).await?;
        sitecaster_relay::publish_to_relays(&record, &options.relays, &collector, &cancel).await;
    }

    if cancel.is_cancelled() {
        return Err(PublishError::Cancelled);
    }

    // Step 7: purge.
    let mut deleted = 0usize;
    if options.purge {
        for entry in &diff.to_delete {
            if cancel.is_cancelled() {
                return Err(PublishError::Cancelled);
            }
            let Some(source) = &entry.source_record else { continue };
            let deletion = build_deletion_record(signer.as_ref(), &source.id).await?;
            sitecaster_relay::publish_to_relays(&deletion, &options.relays, &collector, &cancel).await;

            let mut any_deleted = false;
            for server in &options.servers {
                let result = sitecaster_blobs::delete_blob(&http_client, server, &entry.hash, signer.as_ref()).await;
                any_deleted = any_deleted || result.success;
            }
            if any_deleted {
                deleted += 1;
            } else {
                warn!(path = %entry.path, "failed to delete blob from any configured server");
            }
        }
    }

    if cancel.is_cancelled() {
        return Err(PublishError::Cancelled);
    }

    // Step 8: metadata records.
    if options.metadata.publish_relay_list {
        let tags = options.relays.iter().map(|r| Tag::new("r", [r.clone()])).collect();
        publish_metadata(signer.as_ref(), &options.relays, &collector, &cancel, RELAY_LIST_KIND, tags, "").await?;
    }
    if options.metadata.publish_server_list {
        let tags = options.servers.iter().map(|s| Tag::new("server", [s.clone()])).collect();
        publish_metadata(signer.as_ref(), &options.relays, &collector, &cancel, SERVER_LIST_KIND, tags, "").await?;
    }
    if options.metadata.publish_profile {
        let content = serde_json::to_string(&options.profile).unwrap_or_default();
        publish_metadata(signer.as_ref(), &options.relays, &collector, &cancel, PROFILE_KIND, Vec::new(), &content).await?;
    }

    // Step 9: assemble the summary.
    let snapshot = collector.snapshot().await;
    let summary = RunSummary {
        uploaded,
        unchanged: diff.unchanged.len(),
        deleted,
        noop: false,
        ambiguous,
        uploads_per_server: count_by_key(&snapshot, Category::UploadSuccess),
        accepts_per_relay: count_by_key(&snapshot, Category::RelayAccepted),
        error_groups: error_groups(&snapshot),
        gateway_url,
    };
    info!(%summary, "publish run complete");
    Ok(summary)
}

fn resolve_ignore_path(root: &Path, ignore_file: &str) -> std::path::PathBuf {
    let candidate = Path::new(ignore_file);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

fn local_path_for(root: &Path, logical_path: &str) -> std::path::PathBuf {
    root.join(logical_path.trim_start_matches('/'))
}

/// Reconstruct a [`FileEntry`] from a fetched file-announcement record.
fn record_to_entry(record: Record) -> Option<FileEntry> {
    let path = record.d_tag()?.to_string();
    let hash = record.x_tag()?.to_string();
    let size = record
        .tags
        .iter()
        .find(|t| t.name() == "size")
        .and_then(|t| t.value())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let media_type = record
        .tags
        .iter()
        .find(|t| t.name() == "m")
        .and_then(|t| t.value())
        .unwrap_or("application/octet-stream")
        .to_string();
    Some(FileEntry::remote(path, hash, size, media_type, record))
}

/// HEAD-probe one hash against every server, returning how many reported it
/// present.
async fn probe_servers_for_hash(servers: &[String], hash: &str) -> usize {
    let client = reqwest::Client::new();
    let mut present = 0usize;
    for server in servers {
        let base = if server.ends_with('/') { server.clone() } else { format!("{server}/") };
        let url = format!("{base}{hash}");
        if let Ok(resp) = client.head(&url).send().await {
            if resp.status().is_success() {
                present += 1;
            }
        }
    }
    present
}

async fn build_deletion_record(signer: &dyn Signer, target_record_id: &str) -> Result<Record, PublishError> {
    let template = RecordTemplate::new(
        DELETION_KIND,
        now_unix(),
        vec![Tag::new("e", [target_record_id.to_string()]), Tag::new("expiration", [(now_unix() + DELETION_EXPIRATION_SECS).to_string()])],
        "",
    );
    Ok(signer.sign(template).await?)
}

async fn publish_metadata(
    signer: &dyn Signer,
    relays: &[String],
    collector: &MessageCollector,
    cancel: &CancellationToken,
    kind: u32,
    tags: Vec<Tag>,
    content: &str,
) -> Result<(), PublishError> {
    let template = RecordTemplate::new(kind, now_unix(), tags, content);
    let record = signer.sign(template).await?;
    sitecaster_relay::publish_to_relays(&record, relays, collector, cancel).await;
    Ok(())
}

fn count_by_key(entries: &[sitecaster_relay::CollectorEntry], category: Category) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for entry in entries {
        if entry.category == category {
            *counts.entry(entry.key.clone()).or_insert(0) += 1;
        }
    }
    counts
}

fn error_groups(entries: &[sitecaster_relay::CollectorEntry]) -> Vec<ErrorGroup> {
    let mut order = Vec::new();
    let mut by_summary: HashMap<String, (Vec<String>, usize)> = HashMap::new();

    for entry in entries {
        let is_error = matches!(
            entry.category,
            Category::RelayRejected | Category::RelayRateLimited | Category::RelayTimeout | Category::RelayTransportError | Category::UploadFailure
        );
        if !is_error {
            continue;
        }
        let summary = format!("{:?}: {}", entry.category, entry.message);
        let affected = entry.path.clone().unwrap_or_else(|| entry.key.clone());
        let (paths, overflow) = by_summary.entry(summary.clone()).or_insert_with(|| {
            order.push(summary.clone());
            (Vec::new(), 0)
        });
        if paths.contains(&affected) {
            continue;
        }
        if paths.len() < ERROR_GROUP_PATH_LIMIT {
            paths.push(affected);
        } else {
            *overflow += 1;
        }
    }

    order
        .into_iter()
        .map(|summary| {
            let (affected_paths, overflow) = by_summary.remove(&summary).unwrap_or_default();
            ErrorGroup { summary, affected_paths, overflow }
        })
        .collect()
}

fn gateway_url_for(pubkey_hex: &str, gateway_host: &str) -> Result<String, PublishError> {
    let bytes = hex::decode(pubkey_hex).map_err(|e| PublishError::Encoding(e.to_string()))?;
    let hrp = Hrp::parse("npub").map_err(|e| PublishError::Encoding(e.to_string()))?;
    let npub = bech32::encode::<Bech32>(hrp, &bytes).map_err(|e| PublishError::Encoding(e.to_string()))?;
    Ok(format!("https://{npub}.{gateway_host}/"))
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecaster_types::FILE_ANNOUNCEMENT_KIND;

    #[test]
    fn record_to_entry_extracts_path_hash_size_and_media_type() {
        let record = Record {
            pubkey: "pk".into(),
            created_at: 1,
            kind: FILE_ANNOUNCEMENT_KIND,
            tags: vec![
                Tag::new("d", ["/index.html".to_string()]),
                Tag::new("x", ["deadbeef".to_string()]),
                Tag::new("m", ["text/html".to_string()]),
                Tag::new("size", ["42".to_string()]),
            ],
            content: String::new(),
            id: "id".into(),
            sig: "sig".into(),
        };
        let entry = record_to_entry(record).unwrap();
        assert_eq!(entry.path, "/index.html");
        assert_eq!(entry.hash, "deadbeef");
        assert_eq!(entry.media_type, "text/html");
        assert_eq!(entry.size, 42);
    }

    #[test]
    fn record_to_entry_rejects_missing_d_tag() {
        let record = Record {
            pubkey: "pk".into(),
            created_at: 1,
            kind: FILE_ANNOUNCEMENT_KIND,
            tags: vec![Tag::new("x", ["deadbeef".to_string()])],
            content: String::new(),
            id: "id".into(),
            sig: "sig".into(),
        };
        assert!(record_to_entry(record).is_none());
    }

    #[test]
    fn resolve_ignore_path_joins_relative_paths_under_root() {
        let root = Path::new("/site");
        assert_eq!(resolve_ignore_path(root, ".sitecasterignore"), Path::new("/site/.sitecasterignore"));
        assert_eq!(resolve_ignore_path(root, "/etc/ignore"), Path::new("/etc/ignore"));
    }

    #[test]
    fn local_path_for_strips_leading_slash() {
        let root = Path::new("/site");
        assert_eq!(local_path_for(root, "/a/b.css"), Path::new("/site/a/b.css"));
    }
}

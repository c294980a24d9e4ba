// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Blob uploader: HEAD-probe-then-PUT against a
//! list of blob servers, bounded parallelism across blobs, unbounded
//! parallelism across servers within one blob.

pub mod error;

use std::sync::Arc;

use base64::Engine;
use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sitecaster_signer::Signer;
use sitecaster_types::{FileEntry, Record, RecordTemplate, ServerResult, Tag};

pub use error::BlobError;

/// Default bound on blobs uploaded concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Lifetime of a blob-server authorization record.
const AUTH_EXPIRATION_SECS: i64 = 120;
/// Kind used for blob-server authorization.
const AUTH_KIND: u32 = 24242;

/// Result of uploading one blob to every configured server.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub path: String,
    pub hash: String,
    pub server_results: Vec<ServerResult>,
}

impl UploadOutcome {
    /// A blob is considered stored if at least one server succeeded.
    pub fn stored(&self) -> bool {
        self.server_results.iter().any(|r| r.success)
    }
}

fn normalize_server_url(server: &str) -> String {
    if server.ends_with('/') {
        server.to_string()
    } else {
        format!("{server}/")
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Build and sign a blob-server authorization record.
async fn build_auth_record(signer: &dyn Signer, hash: &str, action: &str) -> Result<Record, BlobError> {
    let template = RecordTemplate::new(
        AUTH_KIND,
        now_unix(),
        vec![
            Tag::new("t", [action.to_string()]),
            Tag::new("x", [hash.to_string()]),
            Tag::new("expiration", [(now_unix() + AUTH_EXPIRATION_SECS).to_string()]),
        ],
        format!("{action} {hash}"),
    );
    Ok(signer.sign(template).await?)
}

fn auth_header(record: &Record) -> String {
    let json = serde_json::to_vec(record).expect("auth record serializes");
    format!("Nostr {}", base64::engine::general_purpose::STANDARD.encode(json))
}

/// Upload one blob to one server: HEAD-probe for an existing copy, then PUT
/// only if it's missing.
async fn upload_to_server(client: &Client, server: &str, entry: &FileEntry, signer: &dyn Signer) -> ServerResult {
    let base = normalize_server_url(server);
    let probe_url = format!("{base}{}", entry.hash);

    match client.head(&probe_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            debug!(%server, hash = %entry.hash, "blob already present");
            return ServerResult::success(server, Some(resp.status().as_u16()));
        }
        Ok(_) => {}
        Err(err) => {
            debug!(%server, %err, "HEAD probe failed, attempting upload anyway");
        }
    }

    let Some(content) = entry.content.as_ref() else {
        return ServerResult::failure(server, BlobError::NoContent.to_string(), None);
    };

    let auth_record = match build_auth_record(signer, &entry.hash, "upload").await {
        Ok(record) => record,
        Err(err) => return ServerResult::failure(server, err.to_string(), None),
    };

    let upload_url = format!("{base}upload");
    let response = client
        .put(&upload_url)
        .header("Authorization", auth_header(&auth_record))
        .body(content.clone())
        .send()
        .await;

    match response {
        Ok(resp) if resp.status().is_success() => ServerResult::success(server, Some(resp.status().as_u16())),
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let summary: String = body.chars().take(200).collect();
            ServerResult::failure(server, summary, Some(status.as_u16()))
        }
        Err(err) => ServerResult::failure(server, format!("transport error: {err}"), None),
    }
}

/// Upload one blob to every server in `servers`, in parallel.
pub async fn upload_blob(client: &Client, entry: &FileEntry, servers: &[String], signer: &dyn Signer) -> UploadOutcome {
    let futures = servers.iter().map(|server| upload_to_server(client, server, entry, signer));
    let server_results = futures_util::future::join_all(futures).await;
    UploadOutcome { path: entry.path.clone(), hash: entry.hash.clone(), server_results }
}

/// Upload every entry in `entries` with at most `concurrency` blobs in
/// flight at once. Checks `cancel` before acquiring each permit, so once
/// cancellation is signaled no new HEAD/PUT is issued for an entry that
/// hasn't already started; in-flight uploads still run to completion.
pub async fn upload_all(
    entries: &[FileEntry],
    servers: &[String],
    signer: Arc<dyn Signer>,
    concurrency: usize,
    client: &Client,
    cancel: &CancellationToken,
) -> Vec<UploadOutcome> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let futures = entries.iter().map(|entry| {
        let semaphore = semaphore.clone();
        let signer = signer.clone();
        let servers = servers.to_vec();
        let client = client.clone();
        let entry = entry.clone();
        let cancel = cancel.clone();
        async move {
            if cancel.is_cancelled() {
                return UploadOutcome {
                    path: entry.path.clone(),
                    hash: entry.hash.clone(),
                    server_results: servers.iter().map(|s| ServerResult::failure(s, "run cancelled", None)).collect(),
                };
            }
            let _permit = semaphore.acquire().await.expect("semaphore is never closed");
            let outcome = upload_blob(&client, &entry, &servers, signer.as_ref()).await;
            if outcome.stored() {
                info!(path = %outcome.path, hash = %outcome.hash, "blob stored");
            } else {
                warn!(path = %outcome.path, hash = %outcome.hash, "blob failed to store on any server");
            }
            outcome
        }
    });
    futures_util::future::join_all(futures).await
}

/// Authenticated DELETE against one server.
pub async fn delete_blob(client: &Client, server: &str, hash: &str, signer: &dyn Signer) -> ServerResult {
    let base = normalize_server_url(server);
    let url = format!("{base}{hash}");

    let auth_record = match build_auth_record(signer, hash, "delete").await {
        Ok(record) => record,
        Err(err) => return ServerResult::failure(server, err.to_string(), None),
    };

    match client.delete(&url).header("Authorization", auth_header(&auth_record)).send().await {
        Ok(resp) if resp.status().is_success() || resp.status() == StatusCode::NOT_FOUND => {
            ServerResult::success(server, Some(resp.status().as_u16()))
        }
        Ok(resp) => ServerResult::failure(server, format!("delete rejected: {}", resp.status()), Some(resp.status().as_u16())),
        Err(err) => ServerResult::failure(server, format!("transport error: {err}"), None),
    }
}

/// Build a file-announcement record for a successfully stored blob.
pub async fn build_announcement_record(signer: &dyn Signer, entry: &FileEntry, app_name: &str) -> Result<Record, BlobError> {
    let template = RecordTemplate::new(
        sitecaster_types::FILE_ANNOUNCEMENT_KIND,
        now_unix(),
        vec![
            Tag::new("d", [entry.path.clone()]),
            Tag::new("x", [entry.hash.clone()]),
            Tag::new("m", [entry.media_type.clone()]),
            Tag::new("size", [entry.size.to_string()]),
            Tag::new("client", [app_name.to_string()]),
        ],
        "",
    );
    Ok(signer.sign(template).await?)
}

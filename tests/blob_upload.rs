// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Exercises `sitecaster-blobs::upload_blob` against a real HTTP server
//! (an `axum` app bound to an ephemeral port) playing the part of a blob
//! server: absent on first HEAD, accepts the PUT, present on a later HEAD.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path as AxumPath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{head, put};
use axum::Router;

use sitecaster_blobs::upload_blob;
use sitecaster_signer::LocalSigner;
use sitecaster_types::FileEntry;

#[derive(Clone)]
struct ServerState {
    stored: Arc<AtomicBool>,
}

async fn probe(State(state): State<ServerState>, AxumPath(_hash): AxumPath<String>) -> StatusCode {
    if state.stored.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn upload(State(state): State<ServerState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or_default();
    if !auth.starts_with("Nostr ") {
        return StatusCode::UNAUTHORIZED;
    }
    if body.is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    state.stored.store(true, Ordering::SeqCst);
    StatusCode::CREATED
}

async fn spawn_mock_blob_server() -> (String, Arc<AtomicBool>) {
    let stored = Arc::new(AtomicBool::new(false));
    let state = ServerState { stored: stored.clone() };
    let app = Router::new().route("/:hash", head(probe)).route("/upload", put(upload)).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), stored)
}

#[tokio::test]
async fn upload_blob_stores_and_is_reported_as_successful() {
    let (server_url, stored) = spawn_mock_blob_server().await;
    let signer = LocalSigner::from_secret_bytes([21u8; 32]).unwrap();
    let entry = FileEntry::local("/index.html", 13, "deadbeef", "text/html").with_content(b"<html></html>".to_vec());

    let client = reqwest::Client::new();
    let outcome = upload_blob(&client, &entry, &[server_url.clone()], &signer).await;

    assert!(outcome.stored());
    assert!(stored.load(Ordering::SeqCst));
    assert_eq!(outcome.server_results.len(), 1);
    assert!(outcome.server_results[0].success);
}

#[tokio::test]
async fn upload_blob_skips_the_put_when_already_present() {
    let (server_url, stored) = spawn_mock_blob_server().await;
    stored.store(true, Ordering::SeqCst);

    let signer = LocalSigner::from_secret_bytes([22u8; 32]).unwrap();
    let entry = FileEntry::local("/index.html", 13, "deadbeef", "text/html").with_content(b"<html></html>".to_vec());

    let client = reqwest::Client::new();
    let outcome = upload_blob(&client, &entry, &[server_url], &signer).await;

    assert!(outcome.stored());
    assert!(outcome.server_results[0].success);
}

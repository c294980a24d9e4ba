// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Exercises `sitecaster-relay::publish_to_relay` against a real WebSocket
//! server instead of an unreachable address, using `axum` bound to an
//! ephemeral port as the fake relay.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use sitecaster_relay::client::publish_to_relay;
use sitecaster_signer::{LocalSigner, Signer};
use sitecaster_types::{RecordTemplate, RelayOutcome, Tag, FILE_ANNOUNCEMENT_KIND};

async fn accept_and_ack(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(handle_socket)
}

async fn handle_socket(mut socket: WebSocket) {
    let Some(Ok(Message::Text(text))) = socket.recv().await else { return };
    let frame: serde_json::Value = serde_json::from_str(&text).expect("valid EVENT frame");
    assert_eq!(frame[0], "EVENT");
    let id = frame[1]["id"].as_str().expect("record has an id").to_string();

    let ok = json!(["OK", id, true, ""]);
    let _ = socket.send(Message::Text(ok.to_string())).await;
}

async fn spawn_mock_relay() -> String {
    let app = Router::new().route("/", get(accept_and_ack));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("ws://{addr}/")
}

#[tokio::test]
async fn publish_to_relay_is_accepted_by_a_well_behaved_relay() {
    let relay_url = spawn_mock_relay().await;

    let signer = LocalSigner::from_secret_bytes([11u8; 32]).unwrap();
    let template = RecordTemplate::new(
        FILE_ANNOUNCEMENT_KIND,
        1_700_000_000,
        vec![Tag::new("d", ["/index.html".to_string()]), Tag::new("x", ["deadbeef".to_string()])],
        "",
    );
    let record = signer.sign(template).await.unwrap();

    let outcome = publish_to_relay(&relay_url, &record).await;
    assert!(matches!(outcome, RelayOutcome::Accepted));
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Relay client: publish a signed record to one
//! relay, or fan out to many.
//!
//! Each publish opens its own connection and closes it after one round trip
//! — a brief-lived, one-message-per-connection model, favoring simplicity
//! over long-lived shared connections.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sitecaster_types::{RelayOutcome, RelayRejectReason, Record};

use crate::collector::{Category, MessageCollector};
use crate::frame::{decode, encode_event, InboundFrame};

/// Time allowed to establish the WebSocket connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Time allowed, after the connection opens, to receive the matching `OK`.
pub const PUBLISH_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Publish `record` to a single relay, returning the per-relay outcome.
pub async fn publish_to_relay(relay_url: &str, record: &Record) -> RelayOutcome {
    let connect = timeout(CONNECT_TIMEOUT, tokio_tungstenite::connect_async(relay_url)).await;
    let (ws_stream, _) = match connect {
        Ok(Ok(pair)) => pair,
        Ok(Err(err)) => return RelayOutcome::TransportError(err.to_string()),
        Err(_) => return RelayOutcome::TransportError("connect timed out".into()),
    };

    let (mut write, mut read) = ws_stream.split();
    let frame = encode_event(record).to_string();
    if let Err(err) = write.send(Message::Text(frame)).await {
        return RelayOutcome::TransportError(err.to_string());
    }

    let deadline = timeout(PUBLISH_ACK_TIMEOUT, async {
        loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => match decode(&text) {
                    Ok(InboundFrame::Ok { id, accepted, message }) if id == record.id => {
                        return Some((accepted, message));
                    }
                    Ok(InboundFrame::Notice { message }) => {
                        debug!(%relay_url, %message, "relay notice");
                        continue;
                    }
                    Ok(_) => continue, // not addressed to this record; ignore
                    Err(err) => {
                        warn!(%relay_url, %err, "malformed frame from relay");
                        continue;
                    }
                },
                Some(Ok(_)) => continue, // non-text frames (ping/binary) ignored
                Some(Err(err)) => return Some((false, err.to_string())),
                None => return None,
            }
        }
    })
    .await;

    let _ = write.close().await;

    match deadline {
        Ok(Some((true, _))) => RelayOutcome::Accepted,
        Ok(Some((false, message))) => {
            RelayOutcome::Rejected { reason: RelayRejectReason::classify(&message), message }
        }
        Ok(None) => RelayOutcome::TransportError("connection closed before OK".into()),
        Err(_) => RelayOutcome::TimedOut,
    }
}

/// Publish `record` to every relay in `relays` in parallel, returning true
/// iff at least one returned `Accepted`. Does not retry.
///
/// Checks `cancel` before opening each connection — once cancellation is
/// signaled, no new connection is attempted for a relay that hasn't already
/// started; connections already in flight still run to completion.
///
/// Per-relay outcomes are pushed into `collector` keyed by relay URL.
pub async fn publish_to_relays(record: &Record, relays: &[String], collector: &MessageCollector, cancel: &CancellationToken) -> bool {
    let futures = relays.iter().map(|relay_url| {
        let relay_url = relay_url.clone();
        let record = record.clone();
        let cancel = cancel.clone();
        async move {
            if cancel.is_cancelled() {
                record_outcome(collector, &relay_url, &RelayOutcome::TransportError("run cancelled".into())).await;
                return false;
            }
            let outcome = publish_to_relay(&relay_url, &record).await;
            record_outcome(collector, &relay_url, &outcome).await;
            outcome.is_accepted()
        }
    });

    let results = futures_util::future::join_all(futures).await;
    results.into_iter().any(|accepted| accepted)
}

async fn record_outcome(collector: &MessageCollector, relay_url: &str, outcome: &RelayOutcome) {
    match outcome {
        RelayOutcome::Accepted => collector.push(Category::RelayAccepted, relay_url, "accepted").await,
        RelayOutcome::Rejected { reason: RelayRejectReason::RateLimited, message } => {
            collector.push(Category::RelayRateLimited, relay_url, message.clone()).await
        }
        RelayOutcome::Rejected { message, .. } => collector.push(Category::RelayRejected, relay_url, message.clone()).await,
        RelayOutcome::TimedOut => collector.push(Category::RelayTimeout, relay_url, "timed out").await,
        RelayOutcome::TransportError(detail) => collector.push(Category::RelayTransportError, relay_url, detail.clone()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_to_relays_true_iff_any_accepted() {
        // Unreachable relay URLs give TransportError, never Accepted; this
        // asserts the contract without needing a live relay server.
        let record = Record {
            pubkey: "pk".into(),
            created_at: 1,
            kind: 34128,
            tags: vec![],
            content: String::new(),
            id: "id".into(),
            sig: "sig".into(),
        };
        let collector = MessageCollector::new();
        let cancel = CancellationToken::new();
        let accepted = publish_to_relays(&record, &["ws://127.0.0.1:1".to_string()], &collector, &cancel).await;
        assert!(!accepted);
        let snapshot = collector.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].category, Category::RelayTransportError);
    }
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Record fetcher: query a relay set for all of a
//! publisher's file-announcement records, aggregate, and deduplicate.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use uuid::Uuid;

use sitecaster_types::{Record, FILE_ANNOUNCEMENT_KIND};

use crate::error::RelayError;
use crate::frame::{decode, encode_close, encode_req, InboundFrame};

/// Idle timeout: how long to wait after the *last* activity before giving
/// up on EOSE.
pub const FETCH_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of fetching from the whole relay set.
#[derive(Debug, Default)]
pub struct FetchResult {
    /// Deduplicated file-announcement records, newest per `d`-tag wins.
    pub records: Vec<Record>,
    /// True iff every relay in the set failed or timed out — "remote state
    /// unknown" rather than "remote state is empty".
    pub inconclusive: bool,
}

/// Fetch all kind-34128 records authored by `publisher_pubkey` from each
/// relay in `relays`, aggregate, and deduplicate by the standard
/// parameterized-replaceable rule.
pub async fn fetch_records(relays: &[String], publisher_pubkey: &str) -> FetchResult {
    let futures = relays.iter().map(|relay_url| fetch_from_relay(relay_url, publisher_pubkey));
    let per_relay = futures_util::future::join_all(futures).await;

    let all_failed = per_relay.iter().all(Result::is_err);
    let mut all_records = Vec::new();
    for result in per_relay {
        match result {
            Ok(records) => all_records.extend(records),
            Err(err) => debug!(%err, "relay fetch failed, contributing zero records"),
        }
    }

    FetchResult { records: dedup(all_records), inconclusive: all_failed && !relays.is_empty() }
}

async fn fetch_from_relay(relay_url: &str, publisher_pubkey: &str) -> Result<Vec<Record>, RelayError> {
    let connect = timeout(Duration::from_secs(10), tokio_tungstenite::connect_async(relay_url)).await;
    let (ws_stream, _) = match connect {
        Ok(Ok(pair)) => pair,
        Ok(Err(err)) => return Err(RelayError::Transport(err.to_string())),
        Err(_) => return Err(RelayError::Transport("connect timed out".into())),
    };

    let sub_id = Uuid::new_v4().to_string();
    let (mut write, mut read) = ws_stream.split();
    let req = encode_req(&sub_id, &[FILE_ANNOUNCEMENT_KIND], &[publisher_pubkey.to_string()]);
    write
        .send(Message::Text(req.to_string()))
        .await
        .map_err(|e| RelayError::Transport(e.to_string()))?;

    let mut records = Vec::new();
    loop {
        let next = timeout(FETCH_IDLE_TIMEOUT, read.next()).await;
        match next {
            Ok(Some(Ok(Message::Text(text)))) => match decode(&text) {
                Ok(InboundFrame::Event { sub_id: sid, record }) if sid == sub_id => records.push(record),
                Ok(InboundFrame::Eose { sub_id: sid }) if sid == sub_id => break,
                Ok(InboundFrame::Notice { message }) => {
                    debug!(%relay_url, %message, "relay notice during fetch");
                }
                Ok(_) => {}
                Err(err) => warn!(%relay_url, %err, "malformed frame during fetch"),
            },
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(err))) => return Err(RelayError::Transport(err.to_string())),
            Ok(None) => break,
            Err(_) => break, // idle timeout: treat like EOSE never arrived, stop waiting
        }
    }

    let _ = write.send(Message::Text(encode_close(&sub_id).to_string())).await;
    let _ = write.close().await;

    Ok(records)
}

/// Keep, per `(pubkey, d-tag)`, the record with the largest `created_at`;
/// ties broken by lexicographically-largest `id`.
fn dedup(records: Vec<Record>) -> Vec<Record> {
    let mut best: HashMap<(String, String), Record> = HashMap::new();
    for record in records {
        let Some(d) = record.d_tag().map(str::to_string) else { continue };
        let key = (record.pubkey.clone(), d);
        match best.get(&key) {
            Some(existing) if !is_newer(&record, existing) => continue,
            _ => {
                best.insert(key, record);
            }
        }
    }
    let mut out: Vec<Record> = best.into_values().collect();
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out
}

fn is_newer(candidate: &Record, existing: &Record) -> bool {
    match candidate.created_at.cmp(&existing.created_at) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => candidate.id > existing.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecaster_types::Tag;

    fn record(created_at: i64, id: &str, path: &str) -> Record {
        Record {
            pubkey: "pk".into(),
            created_at,
            kind: FILE_ANNOUNCEMENT_KIND,
            tags: vec![Tag::new("d", [path.to_string()])],
            content: String::new(),
            id: id.into(),
            sig: "sig".into(),
        }
    }

    #[test]
    fn dedup_keeps_newest_per_path() {
        let records = vec![record(1, "a", "/index.html"), record(2, "b", "/index.html")];
        let out = dedup(records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "b");
    }

    #[test]
    fn dedup_breaks_ties_by_id() {
        let records = vec![record(5, "zzz", "/a"), record(5, "aaa", "/a")];
        let out = dedup(records);
        assert_eq!(out[0].id, "zzz");
    }

    #[test]
    fn dedup_keeps_distinct_paths_separate() {
        let records = vec![record(1, "a", "/index.html"), record(1, "b", "/style.css")];
        let out = dedup(records);
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn all_relays_unreachable_is_inconclusive() {
        let result = fetch_records(&["ws://127.0.0.1:1".to_string()], "pk").await;
        assert!(result.inconclusive);
        assert!(result.records.is_empty());
    }

    #[tokio::test]
    async fn empty_relay_list_is_not_inconclusive() {
        let result = fetch_records(&[], "pk").await;
        assert!(!result.inconclusive);
    }
}

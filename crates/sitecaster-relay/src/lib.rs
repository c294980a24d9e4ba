// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Relay client and record fetcher,
//! plus the shared message collector.
//!
//! Frames are JSON arrays over a WebSocket: verbs `EVENT`, `OK`, `REQ`,
//! `EOSE`, `CLOSE`, `NOTICE`, `AUTH`.

pub mod client;
pub mod collector;
pub mod error;
pub mod fetch;
pub mod frame;

pub use client::{publish_to_relay, publish_to_relays};
pub use collector::{Category, CollectorEntry, MessageCollector};
pub use error::RelayError;
pub use fetch::{fetch_records, FetchResult};

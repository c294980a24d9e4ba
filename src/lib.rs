// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Publishing core for a decentralized static-site deployer: walk a local
//! directory tree, diff it against a publisher's previously announced
//! state on a relay mesh, upload changed content to blob servers, and
//! announce the result — all behind [`publish::run`], the one entry point
//! an external CLI or wizard needs.
//!
//! Everything else in this crate's dependency graph — hashing and ignore
//! matching (`sitecaster-walker`), the wire protocol and record fetcher
//! (`sitecaster-relay`), diffing (`sitecaster-diff`), signing local or
//! remote (`sitecaster-signer`), blob upload (`sitecaster-blobs`), and
//! configuration (`sitecaster-config`) — is usable standalone, but
//! `publish::run` is what wires them into one publish cycle.

pub mod error;
pub mod publish;
pub mod summary;

pub use error::PublishError;
pub use summary::{ErrorGroup, RunSummary};

pub use sitecaster_config::PublishOptions;
pub use sitecaster_signer::{LocalSigner, RemoteSigner, Signer, SignerError};

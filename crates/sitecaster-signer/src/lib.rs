// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Signer abstraction and the remote-signer
//! transport it hides.
//!
//! Two implementations share one trait: [`local::LocalSigner`] signs
//! in-process with a held secret key; [`remote::RemoteSigner`] forwards the
//! same request to another keypair over the relay mesh and suspends until a
//! correlated reply arrives. Callers (the orchestrator, `sitecaster-blobs`)
//! never see that suspension — they just `await` a signed record.

pub mod crypto;
pub mod credential;
pub mod error;
pub mod local;
pub mod remote;

pub use credential::RemoteSignerCredential;
pub use error::SignerError;
pub use local::LocalSigner;
pub use remote::RemoteSigner;

use async_trait::async_trait;
use sitecaster_types::{Record, RecordTemplate};

/// A signer turns a [`RecordTemplate`] into a finished, signed [`Record`].
///
/// Implementations must not reorder requests made by the same caller
/// — the local signer trivially satisfies this by being
/// synchronous; the remote signer satisfies it by completing requests in
/// the order their correlated replies arrive relative to a single caller's
/// `await` points, which `async fn` already guarantees per call site.
#[async_trait]
pub trait Signer: Send + Sync {
    /// 32-byte publisher identity, lowercase hex. May be cached internally
    /// after the first call.
    async fn public_key(&self) -> Result<String, SignerError>;

    /// Sign `template`, producing a complete [`Record`].
    async fn sign(&self, template: RecordTemplate) -> Result<Record, SignerError>;
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Top-level error for a publish run, composing the per-crate
/// error types the orchestrator touches along the way.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("signer error: {0}")]
    Signer(#[from] sitecaster_signer::SignerError),

    #[error("blob error: {0}")]
    Blob(#[from] sitecaster_blobs::BlobError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote state is ambiguous: {0} server(s) report blobs present despite an empty fetched record set; re-run with force to proceed")]
    Ambiguous(usize),

    #[error("run cancelled")]
    Cancelled,

    #[error("encoding error: {0}")]
    Encoding(String),
}

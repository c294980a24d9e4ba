// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("entry has no content loaded for upload")]
    NoContent,

    #[error("signer error: {0}")]
    Signer(#[from] sitecaster_signer::SignerError),
}

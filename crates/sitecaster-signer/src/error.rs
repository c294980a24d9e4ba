// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SignerError {
    #[error("malformed private key: {0}")]
    MalformedKey(String),

    #[error("remote signer unreachable")]
    Unreachable,

    #[error("remote signer rejected the request: {0}")]
    Rejected(String),

    #[error("remote signer timed out")]
    Timeout,

    #[error("encryption error: {0}")]
    Crypto(String),

    #[error("malformed remote-signer credential: {0}")]
    MalformedCredential(String),
}

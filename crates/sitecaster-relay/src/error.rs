// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RelayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out waiting for relay response")]
    TimedOut,

    #[error("relay sent a malformed frame: {0}")]
    MalformedFrame(String),
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Outcome of one (blob, server) upload/probe attempt.
#[derive(Debug, Clone)]
pub struct ServerResult {
    pub server: String,
    pub success: bool,
    pub error: Option<String>,
    pub status: Option<u16>,
}

impl ServerResult {
    pub fn success(server: impl Into<String>, status: Option<u16>) -> Self {
        Self { server: server.into(), success: true, error: None, status }
    }

    pub fn failure(server: impl Into<String>, error: impl Into<String>, status: Option<u16>) -> Self {
        Self { server: server.into(), success: false, error: Some(error.into()), status }
    }
}

/// Why a relay rejected a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelayRejectReason {
    #[error("rate-limited")]
    RateLimited,
    #[error("rejected")]
    Rejected,
}

impl RelayRejectReason {
    /// Classify a relay's human-readable `OK ... false <msg>` message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("rate-limit") || lower.contains("noting too much") {
            RelayRejectReason::RateLimited
        } else {
            RelayRejectReason::Rejected
        }
    }
}

/// Outcome of one (record, relay) publish attempt.
#[derive(Debug, Clone)]
pub enum RelayOutcome {
    Accepted,
    Rejected { reason: RelayRejectReason, message: String },
    TimedOut,
    TransportError(String),
}

impl RelayOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RelayOutcome::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limit_message() {
        assert_eq!(RelayRejectReason::classify("rate-limit: slow down"), RelayRejectReason::RateLimited);
        assert_eq!(RelayRejectReason::classify("noting too much, please wait"), RelayRejectReason::RateLimited);
    }

    #[test]
    fn classifies_other_rejections_as_plain() {
        assert_eq!(RelayRejectReason::classify("invalid signature"), RelayRejectReason::Rejected);
    }
}

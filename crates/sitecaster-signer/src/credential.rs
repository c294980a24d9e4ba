// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::SignerError;

/// Long-lived credential for a remote signer:
/// the signer's public key, the relay set it is reachable on, and a secret
/// used to authenticate the `connect` handshake.
///
/// Minted by the out-of-scope pairing flow; this crate only needs
/// to decode one to reconstitute a ready-to-use [`crate::RemoteSigner`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSignerCredential {
    pub pubkey: String,
    pub relays: Vec<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

impl RemoteSignerCredential {
    pub fn new(pubkey: impl Into<String>, relays: Vec<String>, secret: Option<String>) -> Self {
        Self { pubkey: pubkey.into(), relays, secret }
    }

    /// Encode as a single opaque base64 blob.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("credential serializes");
        BASE64.encode(json)
    }

    /// Decode a blob produced by [`Self::encode`].
    pub fn decode(blob: &str) -> Result<Self, SignerError> {
        let bytes = BASE64.decode(blob).map_err(|e| SignerError::MalformedCredential(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SignerError::MalformedCredential(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_base64() {
        let credential = RemoteSignerCredential::new("pk", vec!["wss://relay.example.com".to_string()], Some("secret".to_string()));
        let blob = credential.encode();
        let decoded = RemoteSignerCredential::decode(&blob).unwrap();
        assert_eq!(decoded.pubkey, "pk");
        assert_eq!(decoded.relays, vec!["wss://relay.example.com".to_string()]);
        assert_eq!(decoded.secret.as_deref(), Some("secret"));
    }

    #[test]
    fn rejects_garbage_blobs() {
        assert!(RemoteSignerCredential::decode("not-base64!!!").is_err());
    }
}

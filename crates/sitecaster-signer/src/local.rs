// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use secp256k1::{Keypair, Secp256k1};
use zeroize::Zeroizing;

use sitecaster_types::{record_id, Record, RecordTemplate};

use crate::error::SignerError;
use crate::Signer;

/// A signer backed by a locally held secret scalar. Pure computation, no I/O; the only way it fails is a
/// malformed key at construction time.
pub struct LocalSigner {
    keypair: Keypair,
    public_key_hex: String,
}

impl LocalSigner {
    /// Build from a 32-byte secret scalar. The input is wrapped in
    /// `Zeroizing` so it is scrubbed from memory as soon as this function
    /// returns, whether construction succeeds or fails — the scalar itself
    /// is never retained beyond what `secp256k1::Keypair` needs internally.
    pub fn from_secret_bytes(secret: [u8; 32]) -> Result<Self, SignerError> {
        let secret = Zeroizing::new(secret);
        let secp = Secp256k1::new();
        let keypair =
            Keypair::from_seckey_slice(&secp, secret.as_slice()).map_err(|e| SignerError::MalformedKey(e.to_string()))?;
        let (xonly, _parity) = keypair.x_only_public_key();
        let public_key_hex = hex::encode(xonly.serialize());
        Ok(Self { keypair, public_key_hex })
    }

    /// Build from a lowercase-hex-encoded 32-byte secret scalar.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(secret_hex).map_err(|e| SignerError::MalformedKey(e.to_string()))?;
        let array: [u8; 32] = bytes.try_into().map_err(|_| SignerError::MalformedKey("secret key must be 32 bytes".into()))?;
        Self::from_secret_bytes(array)
    }

    fn sign_sync(&self, template: &RecordTemplate) -> Record {
        let id = record_id(&self.public_key_hex, template.created_at, template.kind, &template.tags, &template.content);
        let id_bytes = hex::decode(&id).expect("record_id always returns 32 bytes of hex");
        let message = secp256k1::Message::from_digest_slice(&id_bytes).expect("id is exactly 32 bytes");
        let secp = Secp256k1::new();
        let signature = secp.sign_schnorr(&message, &self.keypair);
        Record {
            pubkey: self.public_key_hex.clone(),
            created_at: template.created_at,
            kind: template.kind,
            tags: template.tags.clone(),
            content: template.content.clone(),
            id,
            sig: hex::encode(signature.as_ref()),
        }
    }
}

#[async_trait]
impl Signer for LocalSigner {
    async fn public_key(&self) -> Result<String, SignerError> {
        Ok(self.public_key_hex.clone())
    }

    async fn sign(&self, template: RecordTemplate) -> Result<Record, SignerError> {
        Ok(self.sign_sync(&template))
    }
}

/// Verify a record's signature under its own claimed publisher identity.
pub fn verify(record: &Record) -> bool {
    let Ok(pubkey_bytes) = hex::decode(&record.pubkey) else { return false };
    let Ok(xonly) = secp256k1::XOnlyPublicKey::from_slice(&pubkey_bytes) else { return false };
    let Ok(id_bytes) = hex::decode(&record.id) else { return false };
    let Ok(message) = secp256k1::Message::from_digest_slice(&id_bytes) else { return false };
    let Ok(sig_bytes) = hex::decode(&record.sig) else { return false };
    let Ok(signature) = secp256k1::schnorr::Signature::from_slice(&sig_bytes) else { return false };

    let expected_id = record_id(&record.pubkey, record.created_at, record.kind, &record.tags, &record.content);
    if expected_id != record.id {
        return false;
    }

    let secp = Secp256k1::verification_only();
    secp.verify_schnorr(&signature, &message, &xonly).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecaster_types::Tag;

    fn template() -> RecordTemplate {
        RecordTemplate::new(34128, 1700000000, vec![Tag::new("d", ["/index.html".to_string()]), Tag::new("x", ["deadbeef".to_string()])], "")
    }

    #[tokio::test]
    async fn signs_and_verifies() {
        let signer = LocalSigner::from_secret_bytes([7u8; 32]).unwrap();
        let record = signer.sign(template()).await.unwrap();
        assert_eq!(record.pubkey.len(), 64);
        assert_eq!(record.sig.len(), 128);
        assert!(verify(&record));
    }

    #[tokio::test]
    async fn public_key_is_stable_across_calls() {
        let signer = LocalSigner::from_secret_bytes([3u8; 32]).unwrap();
        let a = signer.public_key().await.unwrap();
        let b = signer.public_key().await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_hex_key_is_rejected() {
        assert!(LocalSigner::from_secret_hex("not-hex").is_err());
        assert!(LocalSigner::from_secret_hex("aabb").is_err());
    }

    #[tokio::test]
    async fn tampering_with_a_field_breaks_verification() {
        let signer = LocalSigner::from_secret_bytes([9u8; 32]).unwrap();
        let mut record = signer.sign(template()).await.unwrap();
        record.content = "tampered".to_string();
        assert!(!verify(&record));
    }
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! ECIES-like envelope encryption for the remote-signer transport:
//! ECDH over the same curve as record identities, HKDF-SHA256 to
//! derive a per-message key, ChaCha20-Poly1305 for authenticated
//! encryption.
//!
//! This combination mirrors a LAN-sync protocol that derives a per-session
//! key via HKDF-SHA256 after an asymmetric key agreement and encrypts with
//! ChaCha20-Poly1305 — the closest real-world precedent for an ECIES-like
//! scheme over secp256k1 keys.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hkdf::Hkdf;
use rand::RngCore;
use secp256k1::ecdh::SharedSecret;
use secp256k1::{PublicKey, SecretKey};
use sha2::Sha256;

use crate::error::SignerError;

const HKDF_INFO: &[u8] = b"sitecaster-remote-signer-v1";
const NONCE_LEN: usize = 12;

/// Derive a 32-byte symmetric key from an ECDH shared secret between our
/// secret key and the peer's public key.
fn derive_key(our_secret: &SecretKey, their_public: &PublicKey) -> [u8; 32] {
    let shared = SharedSecret::new(their_public, our_secret);
    let hkdf = Hkdf::<Sha256>::new(None, shared.as_ref());
    let mut key = [0u8; 32];
    hkdf.expand(HKDF_INFO, &mut key).expect("32 bytes is a valid HKDF-SHA256 output length");
    key
}

/// Encrypt `plaintext` for `their_public`, returning `nonce || ciphertext`
/// (the nonce is not secret and travels alongside the envelope, per
/// standard AEAD practice).
pub fn encrypt(our_secret: &SecretKey, their_public: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, SignerError> {
    let key = derive_key(our_secret, their_public);
    let cipher = ChaCha20Poly1305::new((&key).into());
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let mut out = cipher.encrypt(nonce, plaintext).map_err(|e| SignerError::Crypto(e.to_string()))?;
    let mut envelope = nonce_bytes.to_vec();
    envelope.append(&mut out);
    Ok(envelope)
}

/// Decrypt an envelope produced by [`encrypt`].
pub fn decrypt(our_secret: &SecretKey, their_public: &PublicKey, envelope: &[u8]) -> Result<Vec<u8>, SignerError> {
    if envelope.len() < NONCE_LEN {
        return Err(SignerError::Crypto("envelope too short".into()));
    }
    let (nonce_bytes, ciphertext) = envelope.split_at(NONCE_LEN);
    let key = derive_key(our_secret, their_public);
    let cipher = ChaCha20Poly1305::new((&key).into());
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher.decrypt(nonce, ciphertext).map_err(|e| SignerError::Crypto(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::Secp256k1;

    #[test]
    fn round_trips_between_two_parties() {
        let secp = Secp256k1::new();
        let alice_secret = SecretKey::from_slice(&[1u8; 32]).unwrap();
        let alice_public = PublicKey::from_secret_key(&secp, &alice_secret);
        let bob_secret = SecretKey::from_slice(&[2u8; 32]).unwrap();
        let bob_public = PublicKey::from_secret_key(&secp, &bob_secret);

        let envelope = encrypt(&alice_secret, &bob_public, b"sign_event params").unwrap();
        let plaintext = decrypt(&bob_secret, &alice_public, &envelope).unwrap();
        assert_eq!(plaintext, b"sign_event params");
    }

    #[test]
    fn tampered_ciphertext_fails_to_decrypt() {
        let secp = Secp256k1::new();
        let alice_secret = SecretKey::from_slice(&[3u8; 32]).unwrap();
        let bob_secret = SecretKey::from_slice(&[4u8; 32]).unwrap();
        let bob_public = PublicKey::from_secret_key(&secp, &bob_secret);
        let alice_public = PublicKey::from_secret_key(&secp, &alice_secret);

        let mut envelope = encrypt(&alice_secret, &bob_public, b"hello").unwrap();
        let last = envelope.len() - 1;
        envelope[last] ^= 0xFF;
        assert!(decrypt(&bob_secret, &alice_public, &envelope).is_err());
    }
}

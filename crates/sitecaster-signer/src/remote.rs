// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Remote-interactive signer transport.
//!
//! Modeled as an actor with a mailbox:
//! [`RemoteSigner::connect`] spawns one background task per relay that owns
//! a long-lived subscription for encrypted replies addressed to our session
//! key, decrypts and dispatches each by correlation id; [`Signer::sign`]
//! submits a request and awaits the matching reply without ever exposing
//! that suspension to its caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde_json::{json, Value};
use sitecaster_types::{Record, RecordTemplate, Tag};
use tokio::sync::{oneshot, Mutex, OnceCell};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::credential::RemoteSignerCredential;
use crate::crypto;
use crate::error::SignerError;
use crate::local::LocalSigner;
use crate::Signer;

/// Kind used for the remote-signer envelope.
pub const REMOTE_SIGNER_KIND: u32 = 24133;

/// Default round-trip timeout for a remote-signer request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<Result<Value, SignerError>>>>>;

/// A signer reached over the relay mesh instead of held locally.
pub struct RemoteSigner {
    remote_pubkey_xonly: String,
    remote_pubkey_full: PublicKey,
    session_identity: LocalSigner,
    session_secret: SecretKey,
    relays: Vec<String>,
    pending: PendingMap,
    request_timeout: Duration,
    cached_pubkey: OnceCell<String>,
}

impl RemoteSigner {
    /// Reconstitute a ready-to-use remote signer from a credential blob and
    /// start listening for replies on every relay in the credential.
    pub async fn connect(credential: RemoteSignerCredential, request_timeout: Duration) -> Result<Self, SignerError> {
        let remote_pubkey_bytes =
            hex::decode(&credential.pubkey).map_err(|e| SignerError::MalformedCredential(e.to_string()))?;
        let remote_xonly = secp256k1::XOnlyPublicKey::from_slice(&remote_pubkey_bytes)
            .map_err(|e| SignerError::MalformedCredential(e.to_string()))?;
        // Nostr's ECDH convention assumes even parity for the x-only key.
        let remote_pubkey_full = PublicKey::from_x_only_public_key(remote_xonly, secp256k1::Parity::Even);

        let mut session_bytes = Zeroizing::new([0u8; 32]);
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), session_bytes.as_mut());
        let session_secret =
            SecretKey::from_slice(session_bytes.as_slice()).map_err(|e| SignerError::Crypto(e.to_string()))?;
        let session_identity = LocalSigner::from_secret_bytes(*session_bytes)?;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let session_pubkey_xonly = session_identity.public_key().await?;

        for relay in &credential.relays {
            spawn_listener(relay.clone(), session_secret, remote_pubkey_full, session_pubkey_xonly.clone(), pending.clone());
        }

        let signer = Self {
            remote_pubkey_xonly: credential.pubkey.clone(),
            remote_pubkey_full,
            session_identity,
            session_secret,
            relays: credential.relays.clone(),
            pending,
            request_timeout,
            cached_pubkey: OnceCell::new(),
        };

        signer.call("connect", json!([credential.pubkey, credential.secret.clone().unwrap_or_default()])).await?;

        Ok(signer)
    }

    /// Send a JSON-RPC-style request over the signer's relay set and await
    /// the correlated reply.
    async fn call(&self, method: &str, params: Value) -> Result<Value, SignerError> {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        let request = json!({ "id": id, "method": method, "params": params });
        let plaintext = serde_json::to_vec(&request).expect("request serializes");
        let envelope = crypto::encrypt(&self.session_secret, &self.remote_pubkey_full, &plaintext)?;
        let content = base64::engine::general_purpose::STANDARD.encode(&envelope);

        let template = RecordTemplate::new(
            REMOTE_SIGNER_KIND,
            now_unix(),
            vec![Tag::new("p", [self.remote_pubkey_xonly.clone()])],
            content,
        );
        let record = self.session_identity.sign(template).await?;

        let published =
            sitecaster_relay::publish_to_relays(&record, &self.relays, &sitecaster_relay::MessageCollector::new(), &CancellationToken::new()).await;
        if !published {
            self.pending.lock().await.remove(&id);
            return Err(SignerError::Unreachable);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SignerError::Unreachable),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(SignerError::Timeout)
            }
        }
    }

    /// Liveness check.
    pub async fn ping(&self) -> Result<(), SignerError> {
        self.call("ping", json!([])).await.map(|_| ())
    }
}

#[async_trait]
impl Signer for RemoteSigner {
    async fn public_key(&self) -> Result<String, SignerError> {
        if let Some(cached) = self.cached_pubkey.get() {
            return Ok(cached.clone());
        }
        // The credential already names the remote identity; querying
        // `get_public_key` confirms it rather than discovering it fresh.
        let value = self.call("get_public_key", json!([])).await?;
        let pubkey = value.as_str().map(str::to_string).unwrap_or_else(|| self.remote_pubkey_xonly.clone());
        let _ = self.cached_pubkey.set(pubkey.clone());
        Ok(pubkey)
    }

    async fn sign(&self, template: RecordTemplate) -> Result<Record, SignerError> {
        let params = json!({
            "kind": template.kind,
            "created_at": template.created_at,
            "tags": template.tags.iter().map(|t| t.0.clone()).collect::<Vec<_>>(),
            "content": template.content,
        });
        let value = self.call("sign_event", params).await?;
        serde_json::from_value(value).map_err(|e| SignerError::Crypto(format!("malformed sign_event reply: {e}")))
    }
}

/// Own a relay connection, subscribed for kind-24133 envelopes addressed to
/// our session key, and dispatch decrypted replies to `pending` by
/// correlation id.
fn spawn_listener(
    relay_url: String,
    session_secret: SecretKey,
    remote_pubkey_full: PublicKey,
    session_pubkey_xonly: String,
    pending: PendingMap,
) {
    tokio::spawn(async move {
        let connect = tokio_tungstenite::connect_async(&relay_url).await;
        let (ws_stream, _) = match connect {
            Ok(pair) => pair,
            Err(err) => {
                warn!(%relay_url, %err, "remote-signer listener failed to connect");
                return;
            }
        };

        let sub_id = Uuid::new_v4().to_string();
        let (mut write, mut read) = ws_stream.split();
        let req = json!(["REQ", sub_id, { "kinds": [REMOTE_SIGNER_KIND], "#p": [session_pubkey_xonly] }]);
        if write.send(Message::Text(req.to_string())).await.is_err() {
            return;
        }

        while let Some(message) = read.next().await {
            let Ok(Message::Text(text)) = message else { continue };
            let Ok(frame) = sitecaster_relay::frame::decode(&text) else { continue };
            let sitecaster_relay::frame::InboundFrame::Event { record, .. } = frame else { continue };
            if record.kind != REMOTE_SIGNER_KIND {
                continue;
            }

            let Ok(envelope) = base64::engine::general_purpose::STANDARD.decode(&record.content) else { continue };
            let Ok(plaintext) = crypto::decrypt(&session_secret, &remote_pubkey_full, &envelope) else {
                debug!(%relay_url, "failed to decrypt remote-signer envelope, ignoring");
                continue;
            };
            let Ok(response) = serde_json::from_slice::<Value>(&plaintext) else { continue };
            let Some(id) = response.get("id").and_then(Value::as_str) else { continue };

            let mut guard = pending.lock().await;
            if let Some(sender) = guard.remove(id) {
                let result = match response.get("error") {
                    Some(err) if !err.is_null() => Err(SignerError::Rejected(err.to_string())),
                    _ => Ok(response.get("result").cloned().unwrap_or(Value::Null)),
                };
                let _ = sender.send(result);
            }
        }
    });
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_pubkey_from_credential_reconstructs_a_valid_ecdh_point() {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[5u8; 32]).unwrap();
        let (xonly, _) = secret.x_only_public_key(&secp);
        let full = PublicKey::from_x_only_public_key(xonly, secp256k1::Parity::Even);
        assert_eq!(full.x_only_public_key().0, xonly);
    }
}

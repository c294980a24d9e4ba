// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Kind of a file-announcement record.
pub const FILE_ANNOUNCEMENT_KIND: u32 = 34128;

/// A single ordered tag. `tag.0` is the name (e.g. `"d"`, `"x"`, `"m"`),
/// `tag.1` is the (possibly empty) list of values that follow it.
///
/// Stored as a flat `Vec<String>` rather than `(String, Vec<String>)` so that
/// serialization is a bare JSON array-of-strings, matching the wire format
/// exactly — `tags[0]` is always the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag(pub Vec<String>);

impl Tag {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = String>) -> Self {
        let mut v = vec![name.into()];
        v.extend(values);
        Tag(v)
    }

    pub fn name(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    /// First value after the name, if any (the common case — almost every
    /// tag used by this protocol carries exactly one value).
    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }
}

/// An unsigned record body: everything the signer needs to produce a
/// finished, signed [`Record`].
#[derive(Debug, Clone)]
pub struct RecordTemplate {
    pub kind: u32,
    pub created_at: i64,
    pub tags: Vec<Tag>,
    pub content: String,
}

impl RecordTemplate {
    pub fn new(kind: u32, created_at: i64, tags: Vec<Tag>, content: impl Into<String>) -> Self {
        Self { kind, created_at, tags, content: content.into() }
    }
}

/// An immutable, publisher-signed announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// 32-byte publisher public key, lowercase hex.
    pub pubkey: String,
    pub created_at: i64,
    pub kind: u32,
    pub tags: Vec<Tag>,
    pub content: String,
    /// 32-byte canonical identifier, lowercase hex.
    pub id: String,
    /// 64-byte signature over `id`, lowercase hex.
    pub sig: String,
}

impl Record {
    /// The `d`-tag value (file path for kind 34128, replaceable-parameter for
    /// other parameterized-replaceable kinds), if present.
    pub fn d_tag(&self) -> Option<&str> {
        self.tags.iter().find(|t| t.name() == "d").and_then(Tag::value)
    }

    /// The `x`-tag value (content hash for kind 34128), if present.
    pub fn x_tag(&self) -> Option<&str> {
        self.tags.iter().find(|t| t.name() == "x").and_then(Tag::value)
    }
}

/// Build the deterministic serialization `[0, pubkey, created_at, kind, tags,
/// content]` that the record identifier is hashed over.
///
/// The structure is an array of arrays/strings/numbers only — never a JSON
/// object — so `serde_json`'s default (insertion-order, RFC 8259 escaping)
/// serialization is already byte-identical across platforms; there is no
/// object-key ordering to canonicalize.
pub fn canonical_bytes(pubkey: &str, created_at: i64, kind: u32, tags: &[Tag], content: &str) -> Vec<u8> {
    let tags_value: Vec<Value> = tags
        .iter()
        .map(|t| Value::Array(t.0.iter().map(|s| Value::String(s.clone())).collect()))
        .collect();
    let array = Value::Array(vec![
        Value::from(0),
        Value::String(pubkey.to_string()),
        Value::from(created_at),
        Value::from(kind),
        Value::Array(tags_value),
        Value::String(content.to_string()),
    ]);
    // serde_json's Display/to_vec never inserts whitespace between tokens.
    serde_json::to_vec(&array).expect("canonical array serializes")
}

/// SHA-256 of [`canonical_bytes`], lowercase hex — the record's `id`.
pub fn record_id(pubkey: &str, created_at: i64, kind: u32, tags: &[Tag], content: &str) -> String {
    let bytes = canonical_bytes(pubkey, created_at, kind, tags, content);
    let digest = Sha256::digest(&bytes);
    hex::encode(digest)
}

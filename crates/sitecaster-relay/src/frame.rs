// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Wire frames for the relay transport: a JSON array whose
//! first element is a capitalized verb.

use serde_json::{json, Value};
use sitecaster_types::Record;

use crate::error::RelayError;

/// A decoded incoming frame. Anything whose shape doesn't match one of
/// these is an error, not silently dropped — a relay speaking a different
/// protocol version should be visible in logs.
#[derive(Debug, Clone)]
pub enum InboundFrame {
    Event { sub_id: String, record: Record },
    Ok { id: String, accepted: bool, message: String },
    Eose { sub_id: String },
    Notice { message: String },
    Closed { sub_id: String, message: String },
    Auth { challenge: String },
}

pub fn encode_event(record: &Record) -> Value {
    json!(["EVENT", record])
}

pub fn encode_req(sub_id: &str, kinds: &[u32], authors: &[String]) -> Value {
    json!(["REQ", sub_id, { "kinds": kinds, "authors": authors }])
}

pub fn encode_close(sub_id: &str) -> Value {
    json!(["CLOSE", sub_id])
}

pub fn decode(text: &str) -> Result<InboundFrame, RelayError> {
    let value: Value = serde_json::from_str(text).map_err(|e| RelayError::MalformedFrame(e.to_string()))?;
    let arr = value.as_array().ok_or_else(|| RelayError::MalformedFrame("not a JSON array".into()))?;
    let verb = arr.first().and_then(Value::as_str).ok_or_else(|| RelayError::MalformedFrame("missing verb".into()))?;

    match verb {
        "EVENT" => {
            let sub_id = arr.get(1).and_then(Value::as_str).unwrap_or_default().to_string();
            let record: Record = serde_json::from_value(arr.get(2).cloned().unwrap_or(Value::Null))
                .map_err(|e| RelayError::MalformedFrame(format!("EVENT record: {e}")))?;
            Ok(InboundFrame::Event { sub_id, record })
        }
        "OK" => {
            let id = arr.get(1).and_then(Value::as_str).unwrap_or_default().to_string();
            let accepted = arr.get(2).and_then(Value::as_bool).unwrap_or(false);
            let message = arr.get(3).and_then(Value::as_str).unwrap_or_default().to_string();
            Ok(InboundFrame::Ok { id, accepted, message })
        }
        "EOSE" => {
            let sub_id = arr.get(1).and_then(Value::as_str).unwrap_or_default().to_string();
            Ok(InboundFrame::Eose { sub_id })
        }
        "NOTICE" => {
            let message = arr.get(1).and_then(Value::as_str).unwrap_or_default().to_string();
            Ok(InboundFrame::Notice { message })
        }
        "CLOSED" => {
            let sub_id = arr.get(1).and_then(Value::as_str).unwrap_or_default().to_string();
            let message = arr.get(2).and_then(Value::as_str).unwrap_or_default().to_string();
            Ok(InboundFrame::Closed { sub_id, message })
        }
        "AUTH" => {
            let challenge = arr.get(1).and_then(Value::as_str).unwrap_or_default().to_string();
            Ok(InboundFrame::Auth { challenge })
        }
        other => Err(RelayError::MalformedFrame(format!("unknown verb {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecaster_types::Tag;

    fn sample_record() -> Record {
        Record {
            pubkey: "pk".into(),
            created_at: 1,
            kind: 34128,
            tags: vec![Tag::new("d", ["/a".to_string()])],
            content: String::new(),
            id: "abc".into(),
            sig: "sig".into(),
        }
    }

    #[test]
    fn encode_event_wraps_record_in_array() {
        let v = encode_event(&sample_record());
        assert_eq!(v[0], "EVENT");
        assert_eq!(v[1]["id"], "abc");
    }

    #[test]
    fn decode_ok_true() {
        let text = r#"["OK", "abc", true, ""]"#;
        match decode(text).unwrap() {
            InboundFrame::Ok { id, accepted, .. } => {
                assert_eq!(id, "abc");
                assert!(accepted);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn decode_ok_false_with_reason() {
        let text = r#"["OK", "abc", false, "rate-limit: slow down"]"#;
        match decode(text).unwrap() {
            InboundFrame::Ok { accepted, message, .. } => {
                assert!(!accepted);
                assert_eq!(message, "rate-limit: slow down");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn decode_unknown_verb_is_an_error() {
        assert!(decode(r#"["BOGUS"]"#).is_err());
    }

    #[test]
    fn decode_event_roundtrips_record() {
        let record = sample_record();
        let frame = json!(["EVENT", "sub1", record]);
        match decode(&frame.to_string()).unwrap() {
            InboundFrame::Event { sub_id, record: r } => {
                assert_eq!(sub_id, "sub1");
                assert_eq!(r.id, record.id);
            }
            _ => panic!("wrong variant"),
        }
    }
}

//! Core data models used throughout Member QA.
//!
//! The upstream messages API and the persisted snapshots are loosely
//! typed: the member name may live under `user_name` or `member`, the
//! body under `message` or `content`, and ids may be numbers or strings.
//! All of that variance is absorbed once, here, by deserializing into
//! [`RawMessage`] and normalizing into [`Message`]. The rest of the
//! pipeline only ever sees the strongly-typed form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message identifier as produced by the upstream API.
///
/// Some deployments return numeric ids, others opaque strings; both are
/// accepted and both hash/compare for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Number(u64),
    Text(String),
}

/// A message record in its wire/snapshot shape, before normalization.
///
/// Field-name fallbacks are handled with serde aliases so that documents
/// written by different revisions of the ingestion script all parse:
///
/// | Canonical | Accepted aliases |
/// |-----------|------------------|
/// | `user_name` | `member` |
/// | `message` | `content` |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Optional upstream id, used for deduplication during pagination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    /// Member display name. May be missing or empty.
    #[serde(default, alias = "member")]
    pub user_name: String,
    /// Message body. May be missing or empty.
    #[serde(default, alias = "content")]
    pub message: String,
    /// ISO-8601 timestamp string, if the upstream provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl RawMessage {
    /// Normalize a wire record into a strongly-typed [`Message`].
    ///
    /// Timestamps that fail to parse as RFC 3339 (with or without an
    /// explicit offset) become `None` rather than an error — a bad
    /// timestamp on one record must not poison a whole snapshot.
    pub fn normalize(&self) -> Message {
        Message {
            id: self.id.clone(),
            member: self.user_name.trim().to_string(),
            text: self.message.clone(),
            timestamp: self.timestamp.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Parse an ISO-8601 timestamp, tolerating a missing UTC offset.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Upstream sometimes emits naive timestamps like "2025-11-09T14:30:00".
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// A normalized member message. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Option<MessageId>,
    /// Member display name; empty when the upstream omitted it.
    pub member: String,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A persisted snapshot document.
///
/// Snapshots written by the pagination crawler use the envelope form;
/// hand-made sample files are often a bare array. Both are accepted.
/// Anything else is a malformed source and fails deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotDocument {
    Envelope {
        total: u64,
        items: Vec<RawMessage>,
    },
    Bare(Vec<RawMessage>),
}

impl SnapshotDocument {
    /// Consume the document and return its records, whatever the shape.
    pub fn into_items(self) -> Vec<RawMessage> {
        match self {
            SnapshotDocument::Envelope { items, .. } => items,
            SnapshotDocument::Bare(items) => items,
        }
    }

    /// The advertised total, when the envelope form carried one.
    pub fn total(&self) -> Option<u64> {
        match self {
            SnapshotDocument::Envelope { total, .. } => Some(*total),
            SnapshotDocument::Bare(_) => None,
        }
    }
}

/// A ranked retrieval candidate, produced per query and discarded with it.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Display text: the member name and message body joined, as indexed.
    pub text: String,
    /// Cosine similarity against the query, in `[0.0, 1.0]`.
    pub score: f64,
    /// The source message this candidate was ranked from.
    pub message: Message,
}

/// Entities extracted from a question, threaded through filtering and
/// answer synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedEntities {
    pub member: Option<String>,
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_message_accepts_canonical_fields() {
        let raw: RawMessage =
            serde_json::from_str(r#"{"id": 7, "user_name": "Layla", "message": "hi"}"#).unwrap();
        assert_eq!(raw.id, Some(MessageId::Number(7)));
        assert_eq!(raw.user_name, "Layla");
        assert_eq!(raw.message, "hi");
    }

    #[test]
    fn test_raw_message_accepts_aliased_fields() {
        let raw: RawMessage =
            serde_json::from_str(r#"{"id": "m-1", "member": "Vikram", "content": "hello"}"#)
                .unwrap();
        assert_eq!(raw.id, Some(MessageId::Text("m-1".to_string())));
        assert_eq!(raw.user_name, "Vikram");
        assert_eq!(raw.message, "hello");
    }

    #[test]
    fn test_raw_message_missing_fields_default_empty() {
        let raw: RawMessage = serde_json::from_str(r#"{}"#).unwrap();
        assert!(raw.id.is_none());
        assert!(raw.user_name.is_empty());
        assert!(raw.message.is_empty());
        assert!(raw.timestamp.is_none());
    }

    #[test]
    fn test_normalize_parses_rfc3339_timestamp() {
        let raw = RawMessage {
            id: None,
            user_name: "Amira".to_string(),
            message: "test".to_string(),
            timestamp: Some("2025-11-09T14:30:00Z".to_string()),
        };
        let msg = raw.normalize();
        assert!(msg.timestamp.is_some());
    }

    #[test]
    fn test_normalize_tolerates_naive_and_garbage_timestamps() {
        let naive = RawMessage {
            id: None,
            user_name: String::new(),
            message: String::new(),
            timestamp: Some("2025-11-09T14:30:00".to_string()),
        };
        assert!(naive.normalize().timestamp.is_some());

        let garbage = RawMessage {
            id: None,
            user_name: String::new(),
            message: String::new(),
            timestamp: Some("next thursday-ish".to_string()),
        };
        assert!(garbage.normalize().timestamp.is_none());
    }

    #[test]
    fn test_snapshot_envelope_shape() {
        let doc: SnapshotDocument =
            serde_json::from_str(r#"{"total": 2, "items": [{"user_name": "A", "message": "x"}]}"#)
                .unwrap();
        assert_eq!(doc.total(), Some(2));
        assert_eq!(doc.into_items().len(), 1);
    }

    #[test]
    fn test_snapshot_bare_array_shape() {
        let doc: SnapshotDocument =
            serde_json::from_str(r#"[{"user_name": "A", "message": "x"}]"#).unwrap();
        assert_eq!(doc.total(), None);
        assert_eq!(doc.into_items().len(), 1);
    }

    #[test]
    fn test_snapshot_rejects_unrecognized_shape() {
        let result: Result<SnapshotDocument, _> = serde_json::from_str(r#"{"oops": true}"#);
        assert!(result.is_err());
    }
}

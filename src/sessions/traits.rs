//! Session data model and storage contract.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single transcript message. Immutable once appended; transcript order is
/// conversation chronology and is replayed verbatim to the model backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Rolling structured summary of the user's most recent stated issue.
///
/// Derived from the transcript, never independently authored. All fields are
/// absent until the first user turn. `last_updated` is monotonically
/// non-decreasing across turns.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisputeDigest {
    pub summary: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_user_message: Option<String>,
}

/// Full persisted state of one session: the append-only transcript plus the
/// derived dispute digest.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub dispute: DisputeDigest,
}

/// Durable, keyed persistence for session state.
///
/// A `load` miss is session creation, not an error — the caller synthesizes
/// the empty state. Callers must hold the per-identifier lock
/// (`SessionLocks`) across a load/mutate/save cycle; the store itself only
/// guarantees that individual operations are internally consistent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the persisted state for an identifier, if any exists.
    async fn load(&self, id: &str) -> Result<Option<SessionState>>;

    /// Persist the full state for an identifier, replacing any prior record.
    async fn save(&self, id: &str, state: &SessionState) -> Result<()>;

    /// The name of this store implementation.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let msg = Message::user("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(
            serde_json::to_value(Message::assistant("x")).unwrap()["role"],
            "assistant"
        );
    }

    #[test]
    fn digest_uses_camel_case_wire_names() {
        let digest = DisputeDigest {
            summary: Some("s".into()),
            last_updated: Some(Utc::now()),
            last_user_message: Some("m".into()),
        };
        let json = serde_json::to_value(&digest).unwrap();
        assert!(json.get("lastUpdated").is_some());
        assert!(json.get("lastUserMessage").is_some());
        assert!(json.get("last_updated").is_none());
    }

    #[test]
    fn empty_state_round_trips() {
        let state = SessionState::default();
        let json = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert!(back.messages.is_empty());
        assert!(back.dispute.summary.is_none());
    }
}

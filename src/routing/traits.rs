//! Turn contract types for the session router.

use serde::Serialize;
use thiserror::Error;

use crate::sessions::{DisputeDigest, Message};
use crate::transcript::EmptyMessage;

/// A caller-presented session token resolved to a canonical identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// The canonical session identifier.
    pub id: String,
    /// True when the identifier was minted for this request and the caller
    /// must be handed a credential to retain it.
    pub minted: bool,
}

/// Result of one successful chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// The assistant reply appended this turn (real or diagnostic fallback).
    pub reply: String,
    /// The digest as persisted at the end of the turn.
    pub dispute: DisputeDigest,
    /// Bounded client view: the 20 most recent messages.
    pub messages: Vec<Message>,
}

/// Failure modes of a chat turn.
///
/// Backend unavailability is deliberately absent: it is recovered inside the
/// turn via the diagnostic fallback reply and never fails the turn.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Rejected input; nothing was mutated or persisted.
    #[error(transparent)]
    Validation(#[from] EmptyMessage),
    /// Persistence failed; success cannot be honestly reported.
    #[error("failed to persist session: {0}")]
    Storage(#[source] anyhow::Error),
}

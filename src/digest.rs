//! Dispute digest derivation.
//!
//! A placeholder extraction heuristic: the digest summarizes the most recent
//! user message rather than semantically understanding the dispute. Any
//! replacement must stay idempotent on an unchanged transcript and keep
//! `last_updated` monotonically non-decreasing.

use chrono::{DateTime, Utc};

use crate::sessions::{DisputeDigest, Message, Role};
use crate::util::truncate_with_marker;

/// Fixed summary prefix, kept in sync with the wire contract.
pub const SUMMARY_PREFIX: &str = "Latest dispute description: ";

/// Maximum summary length in characters, including the truncation marker.
pub const SUMMARY_MAX_CHARS: usize = 280;

/// Derive the digest from the transcript.
///
/// Scans backward for the latest user message. When none exists the prior
/// digest is returned untouched — the digest never regresses to empty. The
/// new timestamp is clamped to the prior one so `last_updated` stays
/// non-decreasing even if the wall clock steps backward.
pub fn summarize(
    prior: &DisputeDigest,
    messages: &[Message],
    now: DateTime<Utc>,
) -> DisputeDigest {
    let Some(last_user) = messages.iter().rev().find(|m| m.role == Role::User) else {
        return prior.clone();
    };

    let base = format!("{SUMMARY_PREFIX}{}", last_user.content);
    let last_updated = match prior.last_updated {
        Some(prev) if prev > now => prev,
        _ => now,
    };

    DisputeDigest {
        summary: Some(truncate_with_marker(&base, SUMMARY_MAX_CHARS)),
        last_updated: Some(last_updated),
        last_user_message: Some(last_user.content.clone()),
    }
}

//! Transcript bookkeeping: append operations, the bounded client view, and
//! the model-call transcript.
//!
//! The persisted transcript is append-only. Each successful chat turn adds
//! exactly one user message and one assistant message; nothing here ever
//! rewrites or drops persisted history.

use thiserror::Error;

use crate::sessions::{Message, SessionState};

/// How many trailing messages the client view returns.
pub const RECENT_VIEW_LEN: usize = 20;

/// Rejection for user input that is empty or whitespace-only. Raised before
/// any state is touched, so a rejected message is never persisted.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Message is required")]
pub struct EmptyMessage;

/// Check user input without touching any state. Lets callers fail fast
/// before acquiring the session lock.
pub fn validate_user_text(text: &str) -> Result<(), EmptyMessage> {
    if text.trim().is_empty() {
        return Err(EmptyMessage);
    }
    Ok(())
}

/// Append a user message, rejecting blank input.
pub fn append_user(state: &mut SessionState, text: &str) -> Result<(), EmptyMessage> {
    validate_user_text(text)?;
    state.messages.push(Message::user(text));
    Ok(())
}

/// Append an assistant reply. Fallback diagnostics go through here too, so
/// degraded turns persist the same way as normal ones.
pub fn append_assistant(state: &mut SessionState, text: &str) {
    state.messages.push(Message::assistant(text));
}

/// The last [`RECENT_VIEW_LEN`] messages in order (all, if fewer exist).
pub fn recent_view(state: &SessionState) -> Vec<Message> {
    let start = state.messages.len().saturating_sub(RECENT_VIEW_LEN);
    state.messages[start..].to_vec()
}

/// Build the transcript sent to the model: the synthetic system directive
/// (never persisted) followed by the persisted history including the
/// just-appended user message.
///
/// `max_messages` bounds how much history is replayed to the backend;
/// `0` replays everything. The bound drops only the oldest messages and
/// affects neither the persisted transcript nor the client view.
pub fn model_transcript(
    state: &SessionState,
    directive: &str,
    max_messages: usize,
) -> Vec<Message> {
    let start = if max_messages == 0 {
        0
    } else {
        state.messages.len().saturating_sub(max_messages)
    };

    let mut transcript = Vec::with_capacity(state.messages.len() - start + 1);
    transcript.push(Message::system(directive));
    transcript.extend_from_slice(&state.messages[start..]);
    transcript
}

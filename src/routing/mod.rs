//! Session routing — resolves session identity and serializes chat turns.
//!
//! One router instance owns the session store, the model provider, and the
//! per-identifier lock table. A chat turn runs load → append user → model
//! call → append assistant → summarize → persist as an atomic unit with
//! respect to other turns for the same identifier.

pub mod traits;

pub use traits::{ResolvedIdentity, TurnError, TurnOutcome};

use std::sync::Arc;

use tracing::{info, warn};

use crate::digest;
use crate::identity::{SessionIds, UuidSessionIds};
use crate::providers::{Provider, ProviderError};
use crate::sessions::{SessionLocks, SessionState, SessionStore};
use crate::transcript;
use crate::util::{Clock, SystemClock};

/// System directive injected at model-call time. Never persisted.
pub const SYSTEM_DIRECTIVE: &str = "You are an AI assistant that helps users describe and track \
    bank and credit card transaction disputes. Ask clear follow-up questions when needed, help \
    the user organize the important facts (merchant, date, amount, what went wrong), and draft \
    concise, polite dispute explanations. Keep answers practical, user-friendly, and avoid \
    giving legal or financial advice. When appropriate, summarize the dispute details you have \
    so far in 3-5 bullet points.";

/// Resolves session identity and drives serialized chat turns.
pub struct SessionRouter {
    store: Arc<dyn SessionStore>,
    provider: Arc<dyn Provider>,
    locks: SessionLocks,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn SessionIds>,
    model: String,
    max_model_messages: usize,
}

impl SessionRouter {
    pub fn new(
        store: Arc<dyn SessionStore>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            locks: SessionLocks::new(),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidSessionIds),
            model: model.into(),
            max_model_messages: 0,
        }
    }

    /// Replace the wall clock (tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the identifier generator (tests).
    pub fn with_session_ids(mut self, ids: Arc<dyn SessionIds>) -> Self {
        self.ids = ids;
        self
    }

    /// Bound how many persisted messages are replayed to the backend per
    /// call. `0` replays the full history.
    pub fn with_model_history_bound(mut self, max_messages: usize) -> Self {
        self.max_model_messages = max_messages;
        self
    }

    /// Resolve a caller-presented token to a canonical identifier, minting a
    /// fresh one when absent. Never touches session state.
    pub fn resolve_identity(&self, presented: Option<&str>) -> ResolvedIdentity {
        match presented {
            Some(token) if !token.trim().is_empty() => ResolvedIdentity {
                id: token.to_string(),
                minted: false,
            },
            _ => ResolvedIdentity {
                id: self.ids.mint(),
                minted: true,
            },
        }
    }

    /// Run one chat turn for `session_id`.
    ///
    /// Holds the identifier's lock for the whole pipeline, including the
    /// model call — no other turn for this identifier may begin until the
    /// persist completes or fails terminally.
    pub async fn chat_turn(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<TurnOutcome, TurnError> {
        // Reject blank input before taking the lock; nothing is persisted.
        transcript::validate_user_text(message)?;

        let _guard = self.locks.acquire(session_id).await;

        // A load miss is session creation, not an error.
        let mut state = self
            .store
            .load(session_id)
            .await
            .map_err(TurnError::Storage)?
            .unwrap_or_else(SessionState::default);

        transcript::append_user(&mut state, message)?;

        let call_transcript =
            transcript::model_transcript(&state, SYSTEM_DIRECTIVE, self.max_model_messages);

        // Explicit branch on the backend result: unavailability degrades to
        // a diagnostic reply that is persisted like any other assistant
        // turn. Only storage failures can fail the turn from here on.
        let reply = match self.provider.chat(&self.model, &call_transcript).await {
            Ok(text) => text,
            Err(ProviderError::Unavailable(reason)) => {
                warn!(session = session_id, error = %reason, "model call failed; composing fallback reply");
                fallback_reply(message)
            }
        };

        transcript::append_assistant(&mut state, &reply);
        state.dispute = digest::summarize(&state.dispute, &state.messages, self.clock.now());

        self.store
            .save(session_id, &state)
            .await
            .map_err(TurnError::Storage)?;

        info!(
            session = session_id,
            messages = state.messages.len(),
            "chat turn persisted"
        );

        Ok(TurnOutcome {
            reply,
            dispute: state.dispute.clone(),
            messages: transcript::recent_view(&state),
        })
    }

    /// Diagnostic read of the full persisted state; `None` for identifiers
    /// that never completed a turn.
    pub async fn session_state(&self, session_id: &str) -> anyhow::Result<Option<SessionState>> {
        self.store.load(session_id).await
    }
}

/// The assistant reply used when the backend produced no reply at all. It
/// preserves the conversational contract (every turn has an assistant
/// message) and echoes the input so the flow stays testable end to end.
fn fallback_reply(user_message: &str) -> String {
    format!(
        "The language model backend is unavailable in this environment, so I could not generate \
         a real reply. Check the provider configuration and credentials, then try again.\n\n\
         Echoing your last message so you can still test the flow:\n{user_message}"
    )
}

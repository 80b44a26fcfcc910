//! In-memory session store implementation.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::traits::{SessionState, SessionStore};

/// A session store backed by a mutex-protected hash map. Used by tests and
/// the `memory` backend; state does not survive a restart.
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionState>> {
        let sessions = self.sessions.lock();
        Ok(sessions.get(id).cloned())
    }

    async fn save(&self, id: &str, state: &SessionState) -> Result<()> {
        let mut sessions = self.sessions.lock();
        sessions.insert(id.to_string(), state.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}

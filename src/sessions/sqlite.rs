//! SQLite-backed session store.
//!
//! One row per session identifier holding the full state as JSON. `save` is
//! a single `INSERT OR REPLACE`, so a reader never observes a half-applied
//! write even without the per-session lock.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::traits::{SessionState, SessionStore};

/// Durable session store backed by a SQLite file in the workspace directory.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open (or create) `sessions.db` under the workspace directory.
    pub fn new(workspace_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(workspace_dir).with_context(|| {
            format!(
                "Failed to create workspace directory {}",
                workspace_dir.display()
            )
        })?;
        let db_path = workspace_dir.join("sessions.db");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open session database {}", db_path.display()))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id         TEXT PRIMARY KEY,
                state      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .context("Failed to initialize session schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionState>> {
        let conn = self.conn.lock();
        let raw: Option<String> = conn
            .query_row(
                "SELECT state FROM sessions WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read session row")?;

        match raw {
            Some(json) => {
                let state = serde_json::from_str(&json)
                    .with_context(|| format!("Corrupt session state for id {id}"))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, id: &str, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state).context("Failed to encode session state")?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO sessions (id, state, updated_at) VALUES (?1, ?2, ?3)",
            params![id, json, Utc::now().to_rfc3339()],
        )
        .context("Failed to persist session state")?;
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::{DisputeDigest, Message};
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_returns_none_for_missing_session() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteSessionStore::new(tmp.path()).unwrap();
        assert!(store.load("never-seen").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteSessionStore::new(tmp.path()).unwrap();

        let state = SessionState {
            messages: vec![
                Message::user("I was charged twice at Store X"),
                Message::assistant("Let's collect the details."),
            ],
            dispute: DisputeDigest {
                summary: Some("Latest dispute description: I was charged twice at Store X".into()),
                last_updated: Some(Utc::now()),
                last_user_message: Some("I was charged twice at Store X".into()),
            },
        };

        store.save("session-a", &state).await.unwrap();
        let loaded = store.load("session-a").await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn save_replaces_prior_record() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteSessionStore::new(tmp.path()).unwrap();

        let mut state = SessionState::default();
        state.messages.push(Message::user("first"));
        store.save("session-a", &state).await.unwrap();

        state.messages.push(Message::assistant("second"));
        store.save("session-a", &state).await.unwrap();

        let loaded = store.load("session-a").await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 2);
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let mut state = SessionState::default();
        state.messages.push(Message::user("durable"));

        {
            let store = SqliteSessionStore::new(tmp.path()).unwrap();
            store.save("session-a", &state).await.unwrap();
        }

        let reopened = SqliteSessionStore::new(tmp.path()).unwrap();
        let loaded = reopened.load("session-a").await.unwrap().unwrap();
        assert_eq!(loaded.messages[0].content, "durable");
    }
}

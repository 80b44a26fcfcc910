//! Session persistence — durable per-identifier conversation state.

pub mod in_memory;
pub mod locks;
pub mod sqlite;
pub mod traits;

pub use in_memory::InMemorySessionStore;
pub use locks::SessionLocks;
pub use sqlite::SqliteSessionStore;
pub use traits::{DisputeDigest, Message, Role, SessionState, SessionStore};

use crate::config::SessionConfig;
use anyhow::Result;
use std::path::Path;

/// Factory: create the configured session store backend.
pub fn create_session_store(
    config: &SessionConfig,
    workspace_dir: &Path,
) -> Result<Box<dyn SessionStore>> {
    match config.backend.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(Box::new(InMemorySessionStore::new())),
        _ => Ok(Box::new(SqliteSessionStore::new(workspace_dir)?)),
    }
}

//! Keyed lock table serializing chat turns per session identifier.
//!
//! Each identifier maps to one async mutex. A chat turn holds its
//! identifier's lock for the whole load → mutate → model call → persist
//! pipeline, so no second turn for the same identifier can begin loading
//! until the in-flight turn's persist completes or fails. Distinct
//! identifiers contend on nothing but the table lookup itself.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-identifier async locks. Entries are created on first use and kept for
/// the process lifetime.
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the exclusive turn lock for `id`, waiting behind any turn
    /// already in flight for the same identifier.
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new()
    }
}

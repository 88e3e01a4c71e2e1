//! Session registry.
//!
//! Each conversation gets its own [`SessionContext`] behind its own async
//! mutex: reconcile calls for one session never interleave, while distinct
//! sessions proceed with no shared lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use smith_intent::SessionContext;

/// Maps session identifiers to their contexts.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<AsyncMutex<SessionContext>>>>,
    history_capacity: usize,
}

impl SessionStore {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            history_capacity,
        }
    }

    /// The context for `id`, created on first use.
    pub fn get_or_create(&self, id: &str) -> Arc<AsyncMutex<SessionContext>> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(session = id, "creating session");
                Arc::new(AsyncMutex::new(SessionContext::new(self.history_capacity)))
            })
            .clone()
    }

    /// Drop one session's accumulated state.
    pub fn clear(&self, id: &str) -> bool {
        self.sessions
            .lock()
            .expect("session map poisoned")
            .remove(id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session map poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_created_on_first_use() {
        let store = SessionStore::new(10);
        assert!(store.is_empty());
        let a = store.get_or_create("a");
        let again = store.get_or_create("a");
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new(10);
        let a = store.get_or_create("a");
        let b = store.get_or_create("b");
        assert!(!Arc::ptr_eq(&a, &b));

        // Holding one session's lock does not block the other.
        let _guard = a.lock().await;
        let b_guard = b.try_lock();
        assert!(b_guard.is_ok());
    }

    #[tokio::test]
    async fn test_clear_removes_state() {
        let store = SessionStore::new(10);
        store.get_or_create("a");
        assert!(store.clear("a"));
        assert!(!store.clear("a"));
        assert!(store.is_empty());
    }
}

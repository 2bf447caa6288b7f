use std::collections::HashMap;
use std::sync::Arc;

use labelkit_core::error::CoreError;
use labelkit_core::session::Session;
use labelkit_core::types::SessionId;
use tokio::sync::{Mutex, RwLock};

/// A session behind its own lock.
///
/// Holding the lock for a whole request makes every action, including the
/// flush-then-move pair of navigation, atomic with respect to other
/// requests on the same session.
pub type SharedSession = Arc<Mutex<Session>>;

/// Registry of live annotation sessions.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Sessions live in memory only and are
/// gone when the server stops.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
}

impl SessionStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a fresh session and return it.
    pub async fn create(&self) -> SharedSession {
        let session = Session::new();
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&shared));
        shared
    }

    /// Look up a session by id.
    pub async fn get(&self, id: SessionId) -> Result<SharedSession, CoreError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Drop a session and everything in it.
    pub async fn remove(&self, id: SessionId) -> Result<(), CoreError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: SessionId) -> CoreError {
    CoreError::NotFound {
        entity: "Session",
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn create_get_remove() {
        let store = SessionStore::new();
        let session = store.create().await;
        let id = session.lock().await.id();

        assert_eq!(store.len().await, 1);
        assert!(store.get(id).await.is_ok());

        store.remove(id).await.unwrap();
        assert!(store.is_empty().await);
        assert_matches!(store.get(id).await, Err(CoreError::NotFound { .. }));
        assert_matches!(store.remove(id).await, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.create().await;
        let b = store.create().await;
        a.lock().await.builder.set_columns("title", "body");
        assert!(b.lock().await.builder.header_column.is_empty());
    }
}

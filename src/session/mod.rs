//! Session store — live conversation state per user.
//!
//! Sessions are created on a user's first message and live for the whole
//! process. Each session sits behind its own async mutex so the main flow
//! and reminder checks never interleave a read-then-act on the same user;
//! the outer map lock is only held to look up or insert an entry.

pub mod state;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

pub use state::{SessionState, Step};

/// Shared handle to one user's session.
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// Registry mapping user ids to their sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<i64, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get the session for `user_id`, creating a fresh one if needed.
    pub async fn get_or_create(&self, user_id: i64) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(&user_id) {
            return Arc::clone(handle);
        }
        let mut sessions = self.sessions.write().await;
        let handle = sessions.entry(user_id).or_insert_with(|| {
            tracing::debug!(user_id, "Created session");
            Arc::new(Mutex::new(SessionState::default()))
        });
        Arc::clone(handle)
    }

    /// Get an existing session without creating one.
    pub async fn get(&self, user_id: i64) -> Option<SessionHandle> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    /// Run `f` with exclusive access to the user's session.
    pub async fn with_session<R>(&self, user_id: i64, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let handle = self.get_or_create(user_id).await;
        let mut state = handle.lock().await;
        f(&mut state)
    }

    /// Copy of the user's current state, if a session exists.
    pub async fn snapshot(&self, user_id: i64) -> Option<SessionState> {
        let handle = self.get(user_id).await?;
        let state = handle.lock().await.clone();
        Some(state)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_or_create_returns_same_session() {
        let registry = SessionRegistry::new();
        let a = registry.get_or_create(1).await;
        let b = registry.get_or_create(1).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn get_does_not_create() {
        let registry = SessionRegistry::new();
        assert!(registry.get(5).await.is_none());
        assert!(registry.snapshot(5).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn with_session_mutates_in_place() {
        let registry = SessionRegistry::new();
        registry
            .with_session(1, |s| s.name = Some("Ann".into()))
            .await;
        let snapshot = registry.snapshot(1).await.unwrap();
        assert_eq!(snapshot.name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let registry = SessionRegistry::new();
        let mut handles = Vec::new();
        for user_id in 0..4 {
            for _ in 0..25 {
                let registry = Arc::clone(&registry);
                handles.push(tokio::spawn(async move {
                    registry
                        .with_session(user_id, |s| s.quiz.score += 1)
                        .await;
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap();
        }
        for user_id in 0..4 {
            assert_eq!(registry.snapshot(user_id).await.unwrap().quiz.score, 25);
        }
        assert_eq!(registry.len().await, 4);
    }
}

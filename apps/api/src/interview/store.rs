//! Process-wide session store, keyed by user.
//!
//! The lock only guards map access and is never held across a completion
//! call. Callers work on a snapshot and write it back once a step succeeds,
//! provided nobody replaced or removed the session in the meantime.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::interview::session::{Session, SessionStamp, UserId};

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the user's session, if any.
    pub async fn get(&self, user_id: &UserId) -> Option<Session> {
        self.sessions.lock().await.get(user_id).cloned()
    }

    /// Inserts or replaces the user's session. Returns the replaced one.
    pub async fn save(&self, session: Session) -> Option<Session> {
        self.sessions
            .lock()
            .await
            .insert(session.user_id().clone(), session)
    }

    /// Writes `session` only if the stored one still carries `expected`.
    /// Returns false, leaving the store untouched, when the session was
    /// removed, replaced or advanced since the snapshot was taken.
    pub async fn replace_if(&self, expected: SessionStamp, session: Session) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(session.user_id()) {
            Some(current) if current.stamp() == expected => {
                *current = session;
                true
            }
            _ => false,
        }
    }

    /// Deletes the user's session. A missing session is not an error.
    pub async fn remove(&self, user_id: &UserId) -> Option<Session> {
        self.sessions.lock().await.remove(user_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::catalog::{QuestionCategory, Role};
    use crate::interview::session::{QuestionDescriptor, SessionConfig};

    fn session(user: &str) -> Session {
        let config =
            SessionConfig::new(Role::MiddlePython, 3, [QuestionCategory::Technical]).unwrap();
        Session::new(UserId::from(user), config)
    }

    #[tokio::test]
    async fn test_save_get_remove() {
        let store = SessionStore::new();
        assert!(store.get(&UserId::from("a")).await.is_none());

        assert!(store.save(session("a")).await.is_none());
        assert!(store.save(session("b")).await.is_none());
        assert_eq!(store.len().await, 2);

        let a = store.get(&UserId::from("a")).await.unwrap();
        assert_eq!(a.user_id().as_str(), "a");

        assert!(store.remove(&UserId::from("a")).await.is_some());
        assert!(store.get(&UserId::from("a")).await.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_session_for_same_user() {
        let store = SessionStore::new();
        store.save(session("a")).await;
        let replaced = store.save(session("a")).await;
        assert!(replaced.is_some());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = SessionStore::new();
        store.save(session("a")).await;
        assert!(store.remove(&UserId::from("a")).await.is_some());
        assert!(store.remove(&UserId::from("a")).await.is_none());
        assert!(store.get(&UserId::from("a")).await.is_none());
    }

    fn started(user: &str) -> Session {
        let mut s = session(user);
        s.start(QuestionDescriptor {
            text: "Q1".to_string(),
            category: QuestionCategory::Technical,
        })
        .unwrap();
        s
    }

    #[tokio::test]
    async fn test_replace_if_commits_over_matching_snapshot() {
        let store = SessionStore::new();
        let s = started("a");
        store.save(s.clone()).await;

        let expected = s.stamp();
        let mut next = s;
        next.record_answer("A1", None).unwrap();
        assert!(store.replace_if(expected, next).await);

        let stored = store.get(&UserId::from("a")).await.unwrap();
        assert_eq!(stored.cursor(), 1);
    }

    #[tokio::test]
    async fn test_replace_if_refuses_stale_snapshot() {
        let store = SessionStore::new();
        let s = started("a");
        store.save(s.clone()).await;
        let expected = s.stamp();

        // someone else advanced first
        let mut other = s.clone();
        other.record_answer("first", None).unwrap();
        assert!(store.replace_if(expected, other).await);

        let mut late = s.clone();
        late.record_answer("second", None).unwrap();
        assert!(!store.replace_if(expected, late).await);
        let stored = store.get(&UserId::from("a")).await.unwrap();
        assert_eq!(stored.turns()[0].answer.as_deref(), Some("first"));

        // restarted
        store.save(started("a")).await;
        let mut late = s.clone();
        late.record_answer("third", None).unwrap();
        assert!(!store.replace_if(expected, late).await);
        assert_eq!(store.get(&UserId::from("a")).await.unwrap().cursor(), 0);

        // removed
        store.remove(&UserId::from("a")).await;
        let mut late = s;
        late.record_answer("fourth", None).unwrap();
        assert!(!store.replace_if(expected, late).await);
        assert!(store.get(&UserId::from("a")).await.is_none());
    }
}

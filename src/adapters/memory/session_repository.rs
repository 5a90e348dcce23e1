//! In-memory session repository.
//!
//! Sessions are stored whole behind a `tokio::sync::RwLock`; an update
//! replaces the stored value atomically so readers never observe a
//! partially written session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Session, SessionStage};
use crate::domain::ports::SessionRepository;

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: Session) -> DomainResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(DomainError::SessionAlreadyExists(session.id));
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> DomainResult<Option<Session>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn update(&self, session: Session) -> DomainResult<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            Some(stored) => {
                *stored = session;
                Ok(())
            }
            None => Err(DomainError::SessionNotFound(session.id)),
        }
    }

    async fn list(&self, stage: Option<SessionStage>, limit: usize) -> DomainResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut matching: Vec<Session> = sessions
            .values()
            .filter(|s| stage.is_none_or(|wanted| s.stage() == wanted))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.last_update_time
                .cmp(&a.last_update_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        matching.truncate(limit);
        Ok(matching)
    }

    async fn delete(&self, session_id: &str) -> DomainResult<()> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))
    }

    async fn expire_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<String>> {
        let mut sessions = self.sessions.write().await;
        let mut expired: Vec<String> = sessions
            .values()
            .filter(|s| s.last_update_time < cutoff)
            .map(|s| s.id.clone())
            .collect();
        expired.sort();
        for id in &expired {
            sessions.remove(id);
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemorySessionRepository::new();
        repo.create(Session::new("s1", "https://game.test")).await.unwrap();

        let fetched = repo.get("s1").await.unwrap().unwrap();
        assert_eq!(fetched.url, "https://game.test");
        assert!(repo.get("missing").await.unwrap().is_none());
        assert!(repo.exists("s1").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let repo = InMemorySessionRepository::new();
        repo.create(Session::new("s1", "a")).await.unwrap();
        let err = repo.create(Session::new("s1", "b")).await.unwrap_err();
        assert!(matches!(err, DomainError::SessionAlreadyExists(id) if id == "s1"));
    }

    #[tokio::test]
    async fn test_update_missing_fails() {
        let repo = InMemorySessionRepository::new();
        let err = repo.update(Session::new("nope", "a")).await.unwrap_err();
        assert!(matches!(err, DomainError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_stage_and_limit() {
        let repo = InMemorySessionRepository::new();
        for i in 0..5 {
            repo.create(Session::new(format!("s{i}"), "a")).await.unwrap();
        }
        assert_eq!(repo.list(None, 3).await.unwrap().len(), 3);
        assert_eq!(repo.list(Some(SessionStage::Created), 10).await.unwrap().len(), 5);
        assert!(repo.list(Some(SessionStage::Ranked), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expire_older_than() {
        let repo = InMemorySessionRepository::new();
        let mut old = Session::new("old", "a");
        old.last_update_time = Utc::now() - Duration::hours(48);
        repo.create(old).await.unwrap();
        repo.create(Session::new("fresh", "a")).await.unwrap();

        let expired = repo
            .expire_older_than(Utc::now() - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(expired, vec!["old".to_string()]);
        assert_eq!(repo.len().await, 1);
        assert!(repo.delete("old").await.is_err());
        repo.delete("fresh").await.unwrap();
        assert!(repo.is_empty().await);
    }
}

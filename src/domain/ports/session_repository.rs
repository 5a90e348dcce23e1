/// Session repository port (trait) for dependency injection.
///
/// Defines the contract for session storage operations that infrastructure
/// adapters must implement. Services depend on this trait, not concrete implementations.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Session, SessionStage};

/// Repository trait for session persistence
///
/// Implementations should handle:
/// - Concurrent access with appropriate locking
/// - Whole-session replacement on update (no partial writes)
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Creates a new session
    ///
    /// # Errors
    /// Returns `SessionAlreadyExists` if the ID is taken
    async fn create(&self, session: Session) -> DomainResult<()>;

    /// Retrieves session by ID, `None` if not found
    async fn get(&self, session_id: &str) -> DomainResult<Option<Session>>;

    /// Replaces an existing session
    ///
    /// # Errors
    /// Returns `SessionNotFound` if the session does not exist
    async fn update(&self, session: Session) -> DomainResult<()>;

    /// Lists sessions, most recently updated first
    async fn list(&self, stage: Option<SessionStage>, limit: usize) -> DomainResult<Vec<Session>>;

    /// Deletes a session
    ///
    /// # Errors
    /// Returns `SessionNotFound` if the session does not exist
    async fn delete(&self, session_id: &str) -> DomainResult<()>;

    /// Removes sessions last updated before `cutoff`, returning their IDs
    async fn expire_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<String>>;

    /// Checks if session exists
    async fn exists(&self, session_id: &str) -> DomainResult<bool> {
        Ok(self.get(session_id).await?.is_some())
    }
}

//! Session repository trait

use async_trait::async_trait;

use crate::session::DialogueSession;
use crate::Result;

/// Storage for dialogue sessions
///
/// Sessions are handed out by value. Writers replace the whole session, so two
/// concurrent turns on one id resolve as last write wins.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<DialogueSession>>;

    /// Insert or replace
    async fn put(&self, session: DialogueSession) -> Result<()>;

    /// Returns whether a session was removed
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn list_ids(&self) -> Result<Vec<String>>;

    async fn count(&self) -> Result<usize>;

    /// Store `session` unless that would push a new id past `max_sessions`.
    ///
    /// Replacing an existing id always succeeds. The check and the write must
    /// happen atomically. Returns whether the session was stored.
    async fn put_within_capacity(
        &self,
        session: DialogueSession,
        max_sessions: usize,
    ) -> Result<bool>;
}

//! In-memory session repository
//!
//! Sessions are cloned in and out under a short-lived lock. Concurrent turns
//! on the same id race at whole-session granularity; the last write wins.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use sales_coach_core::{DialogueSession, Result, SessionRepository};

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, DialogueSession>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn get(&self, id: &str) -> Result<Option<DialogueSession>> {
        Ok(self.sessions.read().get(id).cloned())
    }

    async fn put(&self, session: DialogueSession) -> Result<()> {
        self.sessions.write().insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.sessions.write().remove(id).is_some())
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.sessions.read().len())
    }

    async fn put_within_capacity(
        &self,
        session: DialogueSession,
        max_sessions: usize,
    ) -> Result<bool> {
        let mut sessions = self.sessions.write();
        if !sessions.contains_key(&session.id) && sessions.len() >= max_sessions {
            return Ok(false);
        }
        sessions.insert(session.id.clone(), session);
        Ok(true)
    }
}

//! services/api/src/adapters/session_store.rs
//!
//! Process-local implementation of the `SessionStore` port. Sessions live only as
//! long as the process does.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use college_assistant_core::domain::{Identity, SessionRecord};
use college_assistant_core::ports::{PortError, PortResult, SessionStore};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An in-memory session store keyed by the opaque session id.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(
        &self,
        identity: &Identity,
        display_name: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> PortResult<SessionRecord> {
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            display_name: display_name.map(str::to_string),
            created_at: Utc::now(),
            expires_at,
        };
        self.sessions
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn validate_session(&self, session_id: &str) -> PortResult<SessionRecord> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                None => return Err(PortError::NotFound(format!("session {}", session_id))),
                Some(record) if !record.is_expired_at(now) => return Ok(record.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock, re-checking in case it was replaced.
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(session_id)
            .is_some_and(|record| record.is_expired_at(now))
        {
            sessions.remove(session_id);
        }
        Err(PortError::NotFound(format!("session {} has expired", session_id)))
    }

    async fn delete_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn purge_expired(&self) -> PortResult<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired_at(now));
        Ok(before - sessions.len())
    }
}

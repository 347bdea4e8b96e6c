//! crates/college_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Nothing here touches the network, the clock, or a cookie.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A verified user, as returned by the identity verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

// Represents a browser login session (cookie-referenced, server-held)
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl From<&SessionRecord> for Identity {
    fn from(record: &SessionRecord) -> Self {
        Identity {
            user_id: record.user_id.clone(),
            email: record.email.clone(),
        }
    }
}

/// Static facts about the college, loaded once at startup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CollegeInfo {
    pub name: String,
    pub location: String,
    pub founded: String,
    pub popular_programs: Vec<String>,
    pub tuition: String,
    pub application_deadline: String,
    pub contact: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
        }
    }
}

/// A single message sent to the completion provider. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

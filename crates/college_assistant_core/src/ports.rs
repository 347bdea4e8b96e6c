//! crates/college_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the identity provider, the session backend, and the LLM API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domain::{Identity, SessionRecord};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, JWT).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Upstream request failed: {0}")]
    Upstream(String),
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// A stable tag for the error, suitable for JSON payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            PortError::NotFound(_) => "not_found",
            PortError::Unauthorized(_) => "unauthorized",
            PortError::Upstream(_) => "upstream",
            PortError::InvalidResponse(_) => "invalid_response",
            PortError::Unexpected(_) => "unexpected",
        }
    }

    /// The detail text without the kind prefix.
    pub fn detail(&self) -> &str {
        match self {
            PortError::NotFound(d)
            | PortError::Unauthorized(d)
            | PortError::Upstream(d)
            | PortError::InvalidResponse(d)
            | PortError::Unexpected(d) => d,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies an opaque identity token and returns who it belongs to.
    /// Any rejection is reported as `PortError::Unauthorized`.
    async fn verify_token(&self, id_token: &str) -> PortResult<Identity>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        identity: &Identity,
        display_name: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> PortResult<SessionRecord>;

    /// Returns the live session for `session_id`, or `NotFound` when it is
    /// unknown or expired. Expired records are evicted on lookup.
    async fn validate_session(&self, session_id: &str) -> PortResult<SessionRecord>;

    /// Removing an unknown session is not an error.
    async fn delete_session(&self, session_id: &str) -> PortResult<()>;

    /// Drops every expired record and returns how many were removed.
    async fn purge_expired(&self) -> PortResult<usize>;
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends `user_query`, preceded by `system_prompt` when given, and returns
    /// the first generated message.
    async fn complete(&self, user_query: &str, system_prompt: Option<&str>) -> PortResult<String>;
}

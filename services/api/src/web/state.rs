//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use college_assistant_core::domain::CollegeInfo;
use college_assistant_core::ports::{CompletionService, IdentityVerifier, SessionStore};
use sha2::{Digest, Sha512};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub college: Arc<CollegeInfo>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub sessions: Arc<dyn SessionStore>,
    pub completion: Arc<dyn CompletionService>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        college: Arc<CollegeInfo>,
        verifier: Arc<dyn IdentityVerifier>,
        sessions: Arc<dyn SessionStore>,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        let cookie_key = cookie_key_from_secret(&config.session_secret);
        Self {
            config,
            college,
            verifier,
            sessions,
            completion,
            cookie_key,
        }
    }
}

/// Signed cookies need a 64-byte master key; SHA-512 stretches the configured secret to fit.
fn cookie_key_from_secret(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

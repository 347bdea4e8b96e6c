//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use college_assistant_core::domain::Identity;
use college_assistant_core::ports::PortError;
use serde_json::json;
use tracing::{debug, error};

use crate::web::state::AppState;

/// Name of the cookie carrying the signed session id.
pub const SESSION_COOKIE: &str = "session";

/// The session attached to a request that passed the gate.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub session_id: String,
    pub identity: Identity,
    pub display_name: Option<String>,
}

/// Looks up the session named by the signed cookie, if any.
pub async fn resolve_session(state: &AppState, jar: &SignedCookieJar) -> Option<AuthenticatedSession> {
    // The jar only yields cookies whose signature checks out.
    let session_id = jar.get(SESSION_COOKIE)?.value().to_string();

    match state.sessions.validate_session(&session_id).await {
        Ok(record) => Some(AuthenticatedSession {
            identity: Identity::from(&record),
            display_name: record.display_name,
            session_id,
        }),
        Err(PortError::NotFound(reason)) => {
            debug!("Rejected session cookie: {}", reason);
            None
        }
        Err(e) => {
            error!("Failed to validate session: {:?}", e);
            None
        }
    }
}

/// Gate for page routes: without a session the browser is sent to `/login`.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_session(&state, &jar).await {
        Some(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// Gate for JSON routes: without a session the request is denied with 401.
pub async fn require_auth_json(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_session(&state, &jar).await {
        Some(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "response": "Error: authentication required" })),
        )
            .into_response(),
    }
}

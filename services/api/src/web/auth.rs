//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for signup, login, and logout.
//!
//! Login and signup always answer 200 with an in-band `{success, message}` body;
//! a failed attempt never touches the session store or the cookie.

use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Redirect},
    Extension, Form, Json,
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use chrono::{Duration, Utc};
use college_assistant_core::domain::Identity;
use college_assistant_core::ports::PortResult;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::config::Config;
use crate::web::middleware::{AuthenticatedSession, SESSION_COOKIE};
use crate::web::form_or_default;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Default, Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(rename = "idToken")]
    pub id_token: Option<String>,
}

#[derive(Default, Deserialize, ToSchema)]
pub struct SignupForm {
    #[serde(rename = "idToken")]
    pub id_token: Option<String>,
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl AuthResponse {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            full_name: None,
        }
    }

    fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            full_name: None,
        }
    }
}

/// Blank form values count as missing.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//=========================================================================================
// Session Helpers
//=========================================================================================

fn session_cookie(config: &Config, session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

/// Creates a session for `identity` and replaces whatever session the client held.
async fn establish_session(
    state: &AppState,
    jar: SignedCookieJar,
    identity: &Identity,
    display_name: Option<&str>,
) -> PortResult<SignedCookieJar> {
    let expires_at = Utc::now() + Duration::hours(state.config.session_ttl_hours);
    let record = state
        .sessions
        .create_session(identity, display_name, expires_at)
        .await?;

    if let Some(previous) = jar.get(SESSION_COOKIE) {
        if let Err(e) = state.sessions.delete_session(previous.value()).await {
            warn!("Failed to drop previous session: {:?}", e);
        }
    }

    Ok(jar.add(session_cookie(&state.config, record.id)))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /login - Exchange a verified identity token for a session
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "In-band result; check `success`", body = AuthResponse)
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> impl IntoResponse {
    let form = form_or_default(form);
    let Some(id_token) = present(form.id_token) else {
        return (jar, Json(AuthResponse::failure("Missing ID token")));
    };

    let identity = match state.verifier.verify_token(&id_token).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!("Login token verification failed: {}", e);
            return (jar, Json(AuthResponse::failure("Invalid token")));
        }
    };

    match establish_session(&state, jar.clone(), &identity, None).await {
        Ok(jar) => {
            info!(user_id = %identity.user_id, "User logged in");
            (jar, Json(AuthResponse::ok("Login successful")))
        }
        Err(e) => {
            error!("Failed to create session: {:?}", e);
            (jar, Json(AuthResponse::failure("Login failed")))
        }
    }
}

/// POST /signup - First sign-in with a display name
///
/// The supplied email must match the email inside the verified token.
#[utoipa::path(
    post,
    path = "/signup",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "In-band result; check `success`", body = AuthResponse)
    )
)]
pub async fn signup_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    form: Result<Form<SignupForm>, FormRejection>,
) -> impl IntoResponse {
    let form = form_or_default(form);
    let (Some(id_token), Some(full_name), Some(email)) = (
        present(form.id_token),
        present(form.full_name),
        present(form.email),
    ) else {
        return (jar, Json(AuthResponse::failure("Missing fields")));
    };
    let email = email.trim().to_string();

    let verified = match state.verifier.verify_token(&id_token).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!("Signup token verification failed: {}", e);
            return (jar, Json(AuthResponse::failure("Signup failed")));
        }
    };

    if !verified.email.eq_ignore_ascii_case(&email) {
        warn!(user_id = %verified.user_id, "Signup email does not match the verified token");
        return (
            jar,
            Json(AuthResponse::failure("Email does not match verified account")),
        );
    }

    let identity = Identity {
        user_id: verified.user_id,
        email,
    };

    match establish_session(&state, jar.clone(), &identity, Some(&full_name)).await {
        Ok(jar) => {
            info!(user_id = %identity.user_id, "User signed up");
            let mut body = AuthResponse::ok("Signup successful");
            body.full_name = Some(full_name);
            (jar, Json(body))
        }
        Err(e) => {
            error!("Failed to create session: {:?}", e);
            (jar, Json(AuthResponse::failure("Signup failed")))
        }
    }
}

/// GET /logout - Drop the session and send the browser back to the login page
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(session): Extension<AuthenticatedSession>,
    jar: SignedCookieJar,
) -> impl IntoResponse {
    if let Err(e) = state.sessions.delete_session(&session.session_id).await {
        error!("Failed to delete session: {:?}", e);
    }
    info!(user_id = %session.identity.user_id, "User logged out");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login"))
}

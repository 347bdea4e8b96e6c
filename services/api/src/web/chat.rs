//! services/api/src/web/chat.rs
//!
//! The question endpoint: builds the college system prompt and relays the
//! user's query to the completion provider.

use axum::{
    extract::{rejection::FormRejection, State},
    Extension, Form, Json,
};
use college_assistant_core::prompt::build_system_prompt;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::web::form_or_default;
use crate::web::middleware::AuthenticatedSession;
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Default, Deserialize, ToSchema)]
pub struct AskForm {
    #[serde(default)]
    pub query: String,
}

/// Always returned with 200. On failure `response` starts with `Error:` and
/// `error` carries the tagged cause.
#[derive(Debug, Serialize, ToSchema)]
pub struct AskResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AskError>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AskError {
    pub kind: String,
    pub detail: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /ask - Answer a question about the college
#[utoipa::path(
    post,
    path = "/ask",
    request_body(content = AskForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Model answer, or an in-band `Error:` text", body = AskResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn ask_handler(
    State(state): State<AppState>,
    Extension(session): Extension<AuthenticatedSession>,
    form: Result<Form<AskForm>, FormRejection>,
) -> Json<AskResponse> {
    let form = form_or_default(form);
    let system_prompt = build_system_prompt(&state.college);

    match state
        .completion
        .complete(&form.query, Some(&system_prompt))
        .await
    {
        Ok(text) => Json(AskResponse {
            response: text,
            error: None,
        }),
        Err(e) => {
            error!(
                user_id = %session.identity.user_id,
                kind = e.kind(),
                "Completion request failed: {}",
                e
            );
            Json(AskResponse {
                response: format!("Error: {}", e),
                error: Some(AskError {
                    kind: e.kind().to_string(),
                    detail: e.detail().to_string(),
                }),
            })
        }
    }
}

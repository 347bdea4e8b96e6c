//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification of the JSON endpoints.

use crate::web::auth::{AuthResponse, LoginForm, SignupForm};
use crate::web::chat::{AskError, AskForm, AskResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::login_handler,
        crate::web::auth::signup_handler,
        crate::web::chat::ask_handler,
    ),
    components(
        schemas(LoginForm, SignupForm, AuthResponse, AskForm, AskResponse, AskError)
    ),
    tags(
        (name = "College Assistant API", description = "Login and question endpoints for the college chat assistant.")
    )
)]
pub struct ApiDoc;

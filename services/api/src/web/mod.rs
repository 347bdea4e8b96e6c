pub mod auth;
pub mod chat;
pub mod middleware;
pub mod pages;
pub mod rest;
pub mod state;

pub use middleware::{require_auth, require_auth_json, AuthenticatedSession};
pub use state::AppState;

use axum::{
    extract::rejection::FormRejection,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Form, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::debug;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::{login_handler, logout_handler, signup_handler};
use chat::ask_handler;
use pages::{chat_page_handler, index_handler, login_page_handler};
use rest::ApiDoc;

/// An absent, non-form or undecodable body reads as a form with every field missing,
/// so handlers still answer in-band.
pub(crate) fn form_or_default<T: Default>(form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(value)) => value,
        Err(rejection) => {
            debug!("Treating unreadable form body as empty: {}", rejection);
            T::default()
        }
    }
}

/// Builds the complete application router for `state`.
pub fn router(state: AppState) -> Router {
    // An unparsable or wildcard origin yields an empty allow-list.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            HeaderValue::from_str(&state.config.allowed_origin)
                .ok()
                .filter(|origin| origin.as_bytes() != b"*"),
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_page_handler).post(login_handler))
        .route("/signup", post(signup_handler));

    // Page routes: no session -> redirect to /login
    let page_routes = Router::new()
        .route("/chat", get(chat_page_handler))
        .route("/logout", get(logout_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // JSON routes: no session -> 401
    let api_routes = Router::new()
        .route("/ask", post(ask_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth_json,
        ));

    let app_router = Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .merge(api_routes)
        .layer(cors)
        .with_state(state);

    Router::new()
        .merge(app_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

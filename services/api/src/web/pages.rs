//! services/api/src/web/pages.rs
//!
//! The two HTML pages. They are static apart from the Firebase web settings
//! injected into the login page.

use axum::{
    extract::State,
    response::{Html, Redirect},
};

use crate::config::Config;
use crate::web::state::AppState;

const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");
const CHAT_PAGE: &str = include_str!("../../templates/chat.html");

pub fn render_login_page(config: &Config) -> String {
    LOGIN_TEMPLATE
        .replace("{{FIREBASE_API_KEY}}", &config.firebase_api_key)
        .replace(
            "{{FIREBASE_AUTH_DOMAIN}}",
            &format!("{}.firebaseapp.com", config.firebase_project_id),
        )
        .replace("{{FIREBASE_PROJECT_ID}}", &config.firebase_project_id)
}

/// GET /
pub async fn index_handler() -> Redirect {
    Redirect::to("/login")
}

/// GET /login
pub async fn login_page_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_login_page(&state.config))
}

/// GET /chat (behind the auth gate)
pub async fn chat_page_handler() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_page_gets_firebase_settings() {
        let config = Config::from_lookup(|key| match key {
            "SESSION_SECRET" => Some("s".repeat(32)),
            "GROQ_API_KEY" => Some("gsk_test".to_string()),
            "FIREBASE_PROJECT_ID" => Some("lakeside-assistant".to_string()),
            "FIREBASE_API_KEY" => Some("AIzaTestKey".to_string()),
            _ => None,
        })
        .unwrap();

        let page = render_login_page(&config);
        assert!(page.contains("\"AIzaTestKey\""));
        assert!(page.contains("\"lakeside-assistant.firebaseapp.com\""));
        assert!(page.contains("\"lakeside-assistant\""));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn chat_page_posts_to_ask_and_links_logout() {
        assert!(CHAT_PAGE.contains("/ask"));
        assert!(CHAT_PAGE.contains("/logout"));
    }
}

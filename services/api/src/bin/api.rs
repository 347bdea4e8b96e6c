//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FirebaseVerifier, MemorySessionStore, OpenAiCompletionAdapter},
    config::{load_college_info, Config},
    error::ApiError,
    web::{router, AppState},
};
use college_assistant_core::ports::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    let college = Arc::new(load_college_info(&config.college_info_path)?);
    info!(college = %college.name, "College information loaded");

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .build()
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;
    let verifier = Arc::new(FirebaseVerifier::new(
        http,
        config.firebase_project_id.clone(),
        config.firebase_jwks_url.clone(),
    ));

    let completion_client =
        OpenAiCompletionAdapter::client_for(&config.groq_api_key, &config.completion_api_base);
    let completion = Arc::new(OpenAiCompletionAdapter::new(
        completion_client,
        config.completion_model.clone(),
        config.completion_max_tokens,
    ));

    let sessions = Arc::new(MemorySessionStore::new());

    // --- 3. Expire Stale Sessions in the Background ---
    let purge_store = sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match purge_store.purge_expired().await {
                Ok(0) => {}
                Ok(n) => info!("Purged {} expired sessions", n),
                Err(e) => error!("Failed to purge expired sessions: {:?}", e),
            }
        }
    });

    // --- 4. Build the Shared AppState & Router ---
    let app_state = AppState::new(config.clone(), college, verifier, sessions, completion);
    let app = router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

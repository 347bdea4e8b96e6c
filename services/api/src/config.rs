//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use college_assistant_core::CollegeInfo;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::Level;

pub const DEFAULT_COMPLETION_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_COMPLETION_MAX_TOKENS: u32 = 500;
pub const DEFAULT_FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const MIN_SECRET_LEN: usize = 32;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub groq_api_key: String,
    pub completion_api_base: String,
    pub completion_model: String,
    pub completion_max_tokens: u32,
    pub firebase_project_id: String,
    pub firebase_api_key: String,
    pub firebase_jwks_url: String,
    pub college_info_path: PathBuf,
    pub allowed_origin: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("log_level", &self.log_level)
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("cookie_secure", &self.cookie_secure)
            .field("completion_api_base", &self.completion_api_base)
            .field("completion_model", &self.completion_model)
            .field("completion_max_tokens", &self.completion_max_tokens)
            .field("firebase_project_id", &self.firebase_project_id)
            .field("firebase_jwks_url", &self.firebase_jwks_url)
            .field("college_info_path", &self.college_info_path)
            .field("allowed_origin", &self.allowed_origin)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };

        // --- Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:5000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = var_or("ALLOWED_ORIGIN", "http://localhost:5000");

        // --- Session Settings ---
        let session_secret = required("SESSION_SECRET")?;
        if session_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "SESSION_SECRET".to_string(),
                format!("must be at least {} characters", MIN_SECRET_LEN),
            ));
        }

        let session_ttl_hours = parse_number::<i64>("SESSION_TTL_HOURS", &var_or("SESSION_TTL_HOURS", "24"))?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }

        let cookie_secure = parse_bool("COOKIE_SECURE", &var_or("COOKIE_SECURE", "true"))?;

        // --- Completion Provider Settings ---
        let groq_api_key = required("GROQ_API_KEY")?;
        let completion_api_base = var_or("COMPLETION_API_BASE", DEFAULT_COMPLETION_API_BASE)
            .trim_end_matches('/')
            .to_string();
        let completion_model = var_or("COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL);
        let completion_max_tokens = parse_number::<u32>(
            "COMPLETION_MAX_TOKENS",
            &var_or("COMPLETION_MAX_TOKENS", &DEFAULT_COMPLETION_MAX_TOKENS.to_string()),
        )?;

        // --- Identity Provider Settings ---
        let firebase_project_id = required("FIREBASE_PROJECT_ID")?;
        let firebase_api_key = var_or("FIREBASE_API_KEY", "");
        let firebase_jwks_url = var_or("FIREBASE_JWKS_URL", DEFAULT_FIREBASE_JWKS_URL);

        let college_info_path = lookup("COLLEGE_INFO_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./config/college_info.json"));

        Ok(Self {
            bind_address,
            log_level,
            session_secret,
            session_ttl_hours,
            cookie_secure,
            groq_api_key,
            completion_api_base,
            completion_model,
            completion_max_tokens,
            firebase_project_id,
            firebase_api_key,
            firebase_jwks_url,
            college_info_path,
            allowed_origin,
        })
    }
}

/// Reads the static college facts from a JSON file.
pub fn load_college_info(path: &Path) -> Result<CollegeInfo, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidValue("COLLEGE_INFO_PATH".to_string(), msg);
    let raw = std::fs::read_to_string(path)
        .map_err(|e| invalid(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| invalid(format!("{}: {}", path.display(), e)))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string(), format!("'{}' is not a number", value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a boolean", value),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("SESSION_SECRET", "x".repeat(40)),
            ("GROQ_API_KEY", "gsk_test".to_string()),
            ("FIREBASE_PROJECT_ID", "lakeside-assistant".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_fill_optional_settings() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.bind_address.port(), 5000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.session_ttl_hours, 24);
        assert!(config.cookie_secure);
        assert_eq!(config.completion_api_base, DEFAULT_COMPLETION_API_BASE);
        assert_eq!(config.completion_model, "llama3-70b-8192");
        assert_eq!(config.completion_max_tokens, 500);
        assert_eq!(config.firebase_jwks_url, DEFAULT_FIREBASE_JWKS_URL);
        assert_eq!(config.college_info_path, PathBuf::from("./config/college_info.json"));
    }

    #[test]
    fn missing_required_variable_is_reported_by_name() {
        let mut env = base_env();
        env.remove("GROQ_API_KEY");
        match load(&env) {
            Err(ConfigError::MissingVar(name)) => assert_eq!(name, "GROQ_API_KEY"),
            other => panic!("expected MissingVar, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn short_session_secret_is_rejected() {
        let mut env = base_env();
        env.insert("SESSION_SECRET", "too-short".to_string());
        assert!(matches!(load(&env), Err(ConfigError::InvalidValue(k, _)) if k == "SESSION_SECRET"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut env = base_env();
        env.insert("COOKIE_SECURE", "maybe".to_string());
        assert!(matches!(load(&env), Err(ConfigError::InvalidValue(k, _)) if k == "COOKIE_SECURE"));

        let mut env = base_env();
        env.insert("COMPLETION_MAX_TOKENS", "lots".to_string());
        assert!(matches!(load(&env), Err(ConfigError::InvalidValue(k, _)) if k == "COMPLETION_MAX_TOKENS"));

        let mut env = base_env();
        env.insert("SESSION_TTL_HOURS", "0".to_string());
        assert!(matches!(load(&env), Err(ConfigError::InvalidValue(k, _)) if k == "SESSION_TTL_HOURS"));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_api_base() {
        let mut env = base_env();
        env.insert("COMPLETION_API_BASE", "http://127.0.0.1:9999/v1/".to_string());
        assert_eq!(load(&env).unwrap().completion_api_base, "http://127.0.0.1:9999/v1");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", load(&base_env()).unwrap());
        assert!(!rendered.contains("gsk_test"));
        assert!(!rendered.contains(&"x".repeat(40)));
    }

    #[test]
    fn bundled_college_info_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/college_info.json");
        let info = load_college_info(&path).unwrap();
        assert!(!info.name.is_empty());
        assert!(!info.popular_programs.is_empty());
    }

    #[test]
    fn unreadable_college_info_is_a_config_error() {
        let err = load_college_info(Path::new("/nonexistent/college_info.json")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(k, _) if k == "COLLEGE_INFO_PATH"));
    }
}

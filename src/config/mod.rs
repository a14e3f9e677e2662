//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::ai::AiProvider;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Per-request timeout applied by the router
    pub request_timeout: Duration,

    /// Appwrite API endpoint, e.g. https://cloud.appwrite.io/v1
    pub appwrite_endpoint: String,
    /// Appwrite project ID
    pub appwrite_project_id: String,
    /// Appwrite server API key (server only!)
    pub appwrite_api_key: String,
    /// Database holding all collections
    pub appwrite_database_id: String,

    /// Secret used to sign seller bearer tokens
    pub jwt_secret: String,
    /// Lifetime of issued bearer tokens
    pub token_ttl: Duration,

    /// Which LLM provider backs the AI endpoints
    pub ai_provider: AiProvider,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// AI requests allowed per seller per minute
    pub ai_rate_limit_per_minute: u32,

    /// Allowed client origin(s) for CORS, comma-separated
    pub client_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT wins when the platform provides one
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let ai_provider = match env::var("AI_PROVIDER") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid("AI_PROVIDER"))?,
            Err(_) => AiProvider::Gemini,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)?),

            appwrite_endpoint: required("APPWRITE_ENDPOINT")?
                .trim_end_matches('/')
                .to_string(),
            appwrite_project_id: required("APPWRITE_PROJECT_ID")?,
            appwrite_api_key: required("APPWRITE_API_KEY")?,
            appwrite_database_id: env::var("APPWRITE_DATABASE_ID")
                .unwrap_or_else(|_| "retail".to_string()),

            jwt_secret: required("JWT_SECRET")?,
            token_ttl: Duration::from_secs(parse_or::<u64>("TOKEN_TTL_HOURS", 24 * 7)? * 3600),

            ai_provider,
            gemini_api_key: optional("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            ai_rate_limit_per_minute: parse_or("AI_RATE_LIMIT_PER_MINUTE", 20)?,

            client_origin: required("CLIENT_ORIGIN")?,
        })
    }

    /// API key of the selected AI provider, if one was supplied
    pub fn ai_api_key(&self) -> Option<&str> {
        match self.ai_provider {
            AiProvider::Gemini => self.gemini_api_key.as_deref(),
            AiProvider::OpenAi => self.openai_api_key.as_deref(),
        }
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

/// Unset and empty are treated the same
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
impl Config {
    /// Configuration pointing at nothing, for router and use-case tests
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "debug".to_string(),
            log_json: false,
            request_timeout: Duration::from_secs(5),
            appwrite_endpoint: "http://127.0.0.1:1/v1".to_string(),
            appwrite_project_id: "test-project".to_string(),
            appwrite_api_key: "test-key".to_string(),
            appwrite_database_id: "retail".to_string(),
            jwt_secret: "test-secret".to_string(),
            token_ttl: Duration::from_secs(3600),
            ai_provider: AiProvider::Gemini,
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ai_rate_limit_per_minute: 2,
            client_origin: "http://localhost:3000".to_string(),
        }
    }
}

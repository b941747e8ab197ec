//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::LlmBackend;

/// Service configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Endpoint returning the raw question rows (admin sheet bridge).
    pub question_source_url: String,
    /// Timeout for question source fetches.
    pub source_timeout: Duration,
    /// Directory service endpoint that durably stores finished registrations.
    pub directory_url: String,
    /// Bearer key for the directory service.
    pub directory_key: SecretString,
    /// Timeout for directory calls.
    pub directory_timeout: Duration,
    /// LLM backend for the conversational agent.
    pub llm_backend: LlmBackend,
    /// Model identifier.
    pub llm_model: String,
    /// API key for the LLM backend.
    pub llm_api_key: SecretString,
    /// Sessions idle longer than this are pruned (store namespace discarded).
    pub session_idle_timeout: Duration,
}

impl AppConfig {
    /// Build the configuration from `ONBOARD_*` environment variables.
    ///
    /// Optional values fall back to local-dev defaults; the external
    /// collaborator endpoints and the LLM key are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr =
            std::env::var("ONBOARD_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string());

        let question_source_url = required("ONBOARD_QUESTION_SOURCE_URL")?;
        let directory_url = required("ONBOARD_DIRECTORY_URL")?;
        let directory_key = SecretString::from(required("ONBOARD_DIRECTORY_KEY")?);

        let llm_backend = match std::env::var("ONBOARD_LLM_BACKEND")
            .unwrap_or_else(|_| "gemini".to_string())
            .to_lowercase()
            .as_str()
        {
            "gemini" => LlmBackend::Gemini,
            "anthropic" => LlmBackend::Anthropic,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "ONBOARD_LLM_BACKEND".to_string(),
                    message: format!("unknown backend '{other}' (expected gemini or anthropic)"),
                });
            }
        };
        let llm_model = std::env::var("ONBOARD_LLM_MODEL")
            .unwrap_or_else(|_| default_model(llm_backend).to_string());
        let llm_api_key = SecretString::from(required("ONBOARD_LLM_API_KEY")?);

        let session_idle_timeout = duration_var("ONBOARD_SESSION_IDLE_SECS", 3600)?;

        Ok(Self {
            bind_addr,
            question_source_url,
            source_timeout: Duration::from_secs(5),
            directory_url,
            directory_key,
            directory_timeout: Duration::from_secs(10),
            llm_backend,
            llm_model,
            llm_api_key,
            session_idle_timeout,
        })
    }
}

fn default_model(backend: LlmBackend) -> &'static str {
    match backend {
        LlmBackend::Gemini => "gemini-2.5-pro",
        LlmBackend::Anthropic => "claude-sonnet-4-20250514",
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn duration_var(key: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{raw}' is not a number of seconds"),
            }),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

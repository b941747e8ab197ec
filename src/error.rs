//! Error types for Onboard Assist.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Question schema load/normalize errors.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("'{0}' column not found in question sheet")]
    MissingColumn(String),

    #[error("No question rows found")]
    Empty,

    #[error("Question source unavailable: {0}")]
    SourceUnavailable(String),
}

/// Registration payload validation failures.
///
/// Field lists are sorted so the rendered message is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Unexpected fields detected: {}", .0.join(", "))]
    Unexpected(Vec<String>),
}

/// Session state store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Directory service (downstream registration sink) errors.
#[derive(Debug, thiserror::Error)]
#[error("Directory request failed ({status}): {message}")]
pub struct DirectoryError {
    pub status: u16,
    pub message: String,
}

/// Conversational agent failures.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool {name} failed: {reason}")]
    ToolFailed { name: String, reason: String },

    #[error("Agent exceeded {max} tool iterations without a reply")]
    Exhausted { max: usize },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_messages_are_deterministic() {
        let err = ValidationError::Missing(vec!["email".to_string(), "name".to_string()]);
        assert_eq!(err.to_string(), "Missing required fields: email, name");

        let err = ValidationError::Unexpected(vec!["nickname".to_string()]);
        assert_eq!(err.to_string(), "Unexpected fields detected: nickname");
    }

    #[test]
    fn schema_error_names_the_column() {
        let err = SchemaError::MissingColumn("is_active".to_string());
        assert!(err.to_string().contains("is_active"));
    }
}

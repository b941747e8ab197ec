//! Directory service client — the durable sink for finished registrations.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::DirectoryError;

/// External service that durably stores an accepted registration.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Submit a flat answer map. Non-2xx and transport failures surface as
    /// [`DirectoryError`] with a 502-class status.
    async fn create_user(&self, payload: &Map<String, Value>) -> Result<Value, DirectoryError>;
}

/// Envelope returned verbatim to the caller (agent tool or HTTP endpoint).
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status_code: u16,
}

impl DirectoryOutcome {
    pub fn accepted(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status_code: 200,
        }
    }

    pub fn rejected(err: &DirectoryError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.message.clone()),
            status_code: err.status,
        }
    }
}

/// HTTP directory client (bearer-authenticated edge function).
pub struct HttpDirectory {
    client: reqwest::Client,
    url: String,
    key: SecretString,
}

impl HttpDirectory {
    pub fn new(url: impl Into<String>, key: SecretString, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
            key,
        }
    }
}

#[async_trait]
impl DirectoryService for HttpDirectory {
    async fn create_user(&self, payload: &Map<String, Value>) -> Result<Value, DirectoryError> {
        // Reject an empty record before any network traffic.
        if payload.is_empty() {
            return Err(DirectoryError {
                status: 400,
                message: "registration payload must be a non-empty map".to_string(),
            });
        }

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.key.expose_secret())
            .json(payload)
            .send()
            .await
            .map_err(|e| DirectoryError {
                status: 502,
                message: format!("Directory request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError {
                status: 502,
                message: format!("Directory request failed: {status}"),
            });
        }

        // Non-JSON bodies are wrapped rather than treated as failures.
        let text = response.text().await.map_err(|e| DirectoryError {
            status: 502,
            message: format!("Directory request failed: {e}"),
        })?;
        Ok(serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::json!({ "raw_response": text })))
    }
}

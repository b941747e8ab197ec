//! Question source seam — where the raw tabular rows come from.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SchemaError;

/// External supplier of raw question rows (header row + data rows).
///
/// The admin sheet bridge is the production implementation; tests stub this.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, SchemaError>;
}

/// Wire shape of the sheet bridge response.
#[derive(Debug, Deserialize)]
struct SheetResponse {
    status: String,
    #[serde(default)]
    values: Vec<Vec<String>>,
    #[serde(default)]
    error_message: Option<String>,
}

/// HTTP question source talking to the sheet bridge endpoint.
pub struct HttpQuestionSource {
    client: reqwest::Client,
    url: String,
}

impl HttpQuestionSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, SchemaError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SchemaError::SourceUnavailable(e.to_string()))?;

        let body: SheetResponse = response
            .json()
            .await
            .map_err(|e| SchemaError::SourceUnavailable(e.to_string()))?;

        if body.status != "success" {
            let message = body
                .error_message
                .unwrap_or_else(|| "Unknown error occurred".to_string());
            return Err(SchemaError::SourceUnavailable(message));
        }

        Ok(body.values)
    }
}

//! Agent-callable tools — thin wrappers over the orchestration contract.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::llm::ToolDefinition;
use crate::service::OnboardingService;
use crate::session::SessionIdentity;

/// Tool invocation errors, rendered back to the model as text.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// A capability the onboarding agent can invoke during its reasoning.
///
/// Every tool runs against the caller's session; tools never see another
/// session's state.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> Value;

    async fn execute(
        &self,
        params: Value,
        session: &SessionIdentity,
    ) -> Result<Value, ToolError>;

    /// Definition handed to the LLM for function calling.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The fixed toolset wired to one service instance.
pub fn toolset(service: Arc<OnboardingService>) -> Vec<Arc<dyn AgentTool>> {
    vec![
        Arc::new(LoadSchemaTool {
            service: Arc::clone(&service),
        }),
        Arc::new(StatusTool {
            service: Arc::clone(&service),
        }),
        Arc::new(SaveAnswersTool {
            service: Arc::clone(&service),
        }),
        Arc::new(RegisterTool { service }),
    ]
}

// ── load_question_schema ────────────────────────────────────────────

struct LoadSchemaTool {
    service: Arc<OnboardingService>,
}

#[async_trait]
impl AgentTool for LoadSchemaTool {
    fn name(&self) -> &str {
        "load_question_schema"
    }

    fn description(&self) -> &str {
        "Fetch the onboarding questions from the backend and cache them for \
         this conversation. Call once at the start."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(
        &self,
        _params: Value,
        session: &SessionIdentity,
    ) -> Result<Value, ToolError> {
        let schema = self
            .service
            .load_schema(session)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to fetch questions: {e}")))?;

        serde_json::to_value(&schema)
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))
    }
}

// ── onboarding_status ───────────────────────────────────────────────

struct StatusTool {
    service: Arc<OnboardingService>,
}

#[async_trait]
impl AgentTool for StatusTool {
    fn name(&self) -> &str {
        "onboarding_status"
    }

    fn description(&self) -> &str {
        "List every onboarding question with its status (PENDING or \
         COMPLETED), priority, mandatory flag, and the saved value if any. \
         Call before asking a question and after saving an answer."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(
        &self,
        _params: Value,
        session: &SessionIdentity,
    ) -> Result<Value, ToolError> {
        let report = self.service.status(session).await;
        Ok(json!({ "onboarding_status": report }))
    }
}

// ── save_user_info ──────────────────────────────────────────────────

struct SaveAnswersTool {
    service: Arc<OnboardingService>,
}

#[async_trait]
impl AgentTool for SaveAnswersTool {
    fn name(&self) -> &str {
        "save_user_info"
    }

    fn description(&self) -> &str {
        "Save one or multiple user answers. Keys must match the entity_key \
         field from the status report, e.g. {\"data\": {\"name\": \"Ada\"}}."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "data": {
                    "type": "object",
                    "description": "Answer map keyed by entity_key",
                    "additionalProperties": true
                }
            },
            "required": ["data"]
        })
    }

    async fn execute(
        &self,
        params: Value,
        session: &SessionIdentity,
    ) -> Result<Value, ToolError> {
        let data = params
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| {
                ToolError::InvalidParameters("'data' must be a non-null object".to_string())
            })?;
        if data.is_empty() {
            return Err(ToolError::InvalidParameters(
                "'data' must contain at least one answer".to_string(),
            ));
        }

        let saved = self
            .service
            .save_answers(session, data)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        Ok(json!({ "status": "success", "saved": saved }))
    }
}

// ── register_user ───────────────────────────────────────────────────

struct RegisterTool {
    service: Arc<OnboardingService>,
}

#[async_trait]
impl AgentTool for RegisterTool {
    fn name(&self) -> &str {
        "register_user"
    }

    fn description(&self) -> &str {
        "Submit the collected answers to the directory service. Call only \
         after every mandatory question is COMPLETED (optional ones may \
         still be pending if the user wants to finish early)."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(
        &self,
        _params: Value,
        session: &SessionIdentity,
    ) -> Result<Value, ToolError> {
        let outcome = self
            .service
            .finalize(session)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        serde_json::to_value(&outcome)
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))
    }
}

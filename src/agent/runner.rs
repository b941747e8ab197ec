//! AgentRunner — per-session conversation history and the LLM↔tool loop.
//!
//! One runner is constructed at startup and shared by reference across
//! request handlers; conversational context lives in the runner for the
//! process lifetime, keyed by session identity.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::agent::prompts::ONBOARDING_SYSTEM_PROMPT;
use crate::agent::tools::{AgentTool, toolset};
use crate::error::AgentError;
use crate::llm::{ChatMessage, LlmProvider, ToolCall, ToolCompletionRequest, ToolDefinition};
use crate::service::OnboardingService;
use crate::session::SessionIdentity;

/// Hard cap on LLM↔tool round trips within one user turn.
const MAX_TOOL_ITERATIONS: usize = 8;

/// Shown when the model produces no usable text.
const FALLBACK_REPLY: &str = "Sorry, I didn't quite catch that — could you say it again?";

/// Drives the onboarding conversation for every session.
pub struct AgentRunner {
    llm: Arc<dyn LlmProvider>,
    tools: Vec<Arc<dyn AgentTool>>,
    histories: RwLock<HashMap<SessionIdentity, Vec<ChatMessage>>>,
}

impl AgentRunner {
    pub fn new(llm: Arc<dyn LlmProvider>, service: Arc<OnboardingService>) -> Self {
        Self {
            llm,
            tools: toolset(service),
            histories: RwLock::new(HashMap::new()),
        }
    }

    /// Process one user turn: run the LLM against the session's history,
    /// executing requested tools (in order, within this session) until the
    /// model produces text.
    pub async fn ask(
        &self,
        session: &SessionIdentity,
        user_message: &str,
    ) -> Result<String, AgentError> {
        let mut transcript = {
            let histories = self.histories.read().await;
            histories.get(session).cloned().unwrap_or_default()
        };
        transcript.push(ChatMessage::user(user_message));

        let definitions: Vec<ToolDefinition> =
            self.tools.iter().map(|t| t.definition()).collect();

        for _ in 0..MAX_TOOL_ITERATIONS {
            let mut messages = vec![ChatMessage::system(ONBOARDING_SYSTEM_PROMPT)];
            messages.extend(transcript.iter().cloned());

            let request = ToolCompletionRequest::new(messages, definitions.clone());
            let response = self.llm.complete_with_tools(request).await?;

            if response.tool_calls.is_empty() {
                let reply = match response.content {
                    Some(text) if !text.trim().is_empty() => text,
                    _ => FALLBACK_REPLY.to_string(),
                };
                transcript.push(ChatMessage::assistant(reply.clone()));
                self.histories
                    .write()
                    .await
                    .insert(*session, transcript);
                return Ok(reply);
            }

            transcript.push(ChatMessage::tool_calls(response.tool_calls.clone()));
            for call in response.tool_calls {
                let output = self.execute_tool(&call, session).await;
                transcript.push(ChatMessage::tool_result(call.id, call.name, output));
            }
        }

        Err(AgentError::Exhausted {
            max: MAX_TOOL_ITERATIONS,
        })
    }

    /// Drop a session's conversation history (page reload starts fresh).
    pub async fn forget(&self, session: &SessionIdentity) {
        self.histories.write().await.remove(session);
    }

    /// Execute one tool call. Failures are folded into the result payload so
    /// the model can recover instead of aborting the turn.
    async fn execute_tool(&self, call: &ToolCall, session: &SessionIdentity) -> Value {
        let Some(tool) = self.tools.iter().find(|t| t.name() == call.name) else {
            tracing::warn!(tool = %call.name, "Model requested an unknown tool");
            let err = AgentError::ToolFailed {
                name: call.name.clone(),
                reason: "unknown tool".to_string(),
            };
            return json!({"status": "error", "message": err.to_string()});
        };

        tracing::debug!(session = %session, tool = %call.name, "Executing tool");
        match tool.execute(call.arguments.clone(), session).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tool = %call.name, "Tool failed: {}", e);
                json!({"status": "error", "message": e.to_string()})
            }
        }
    }
}

//! Bridges rig-core's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;

use rig::OneOrMany;
use rig::completion::{AssistantContent, CompletionModel, CompletionRequestBuilder};
use rig::message::{Message as RigMessage, ToolResultContent, UserContent};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatContent, ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role, ToolCall,
    ToolCompletionRequest, ToolCompletionResponse,
};

/// Adapter from a concrete rig completion model to [`LlmProvider`].
pub struct RigAdapter<M: CompletionModel> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }

    /// Split our message list into (preamble, history, final message).
    ///
    /// rig wants system text as a preamble and the last message as the
    /// request prompt; everything in between rides as chat history.
    fn split_messages(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<(Option<String>, Vec<RigMessage>, RigMessage), LlmError> {
        let mut preamble_parts: Vec<String> = Vec::new();
        let mut converted: Vec<RigMessage> = Vec::new();

        for message in messages {
            match (message.role, message.content) {
                (Role::System, ChatContent::Text(text)) => preamble_parts.push(text),
                (Role::User, ChatContent::Text(text)) => converted.push(RigMessage::user(text)),
                (Role::Assistant, ChatContent::Text(text)) => {
                    converted.push(RigMessage::assistant(text))
                }
                (_, ChatContent::ToolCalls(calls)) => {
                    let contents: Vec<AssistantContent> = calls
                        .into_iter()
                        .map(|c| AssistantContent::tool_call(c.id, c.name, c.arguments))
                        .collect();
                    let content =
                        OneOrMany::many(contents).map_err(|e| LlmError::InvalidResponse {
                            provider: self.model_name.clone(),
                            reason: format!("Empty tool call batch: {e}"),
                        })?;
                    converted.push(RigMessage::Assistant { id: None, content });
                }
                (_, ChatContent::ToolResult {
                    call_id,
                    name: _,
                    output,
                }) => {
                    let result = UserContent::tool_result(
                        call_id,
                        OneOrMany::one(ToolResultContent::text(output.to_string())),
                    );
                    converted.push(RigMessage::User {
                        content: OneOrMany::one(result),
                    });
                }
            }
        }

        let last = converted.pop().ok_or_else(|| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: "Request contained no messages".to_string(),
        })?;

        let preamble = if preamble_parts.is_empty() {
            None
        } else {
            Some(preamble_parts.join("\n\n"))
        };

        Ok((preamble, converted, last))
    }

    async fn run(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<crate::llm::provider::ToolDefinition>,
        max_tokens: Option<u64>,
        temperature: Option<f64>,
    ) -> Result<ToolCompletionResponse, LlmError> {
        let (preamble, history, prompt) = self.split_messages(messages)?;

        let mut builder = CompletionRequestBuilder::new(self.model.clone(), prompt);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        builder = builder.messages(history);
        for tool in tools {
            builder = builder.tool(rig::completion::ToolDefinition {
                name: tool.name,
                description: tool.description,
                parameters: tool.parameters,
            });
        }
        if let Some(max_tokens) = max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = temperature {
            builder = builder.temperature(temperature);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.model_name.clone(),
                reason: e.to_string(),
            })?;

        let mut text_parts: Vec<String> = Vec::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        for choice in response.choice.iter() {
            match choice {
                AssistantContent::Text(text) => text_parts.push(text.text.clone()),
                AssistantContent::ToolCall(call) => tool_calls.push(ToolCall {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments: call.function.arguments.clone(),
                }),
                _ => {}
            }
        }

        let content = if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join(""))
        };

        Ok(ToolCompletionResponse {
            content,
            tool_calls,
            input_tokens: response.usage.input_tokens as u32,
            output_tokens: response.usage.output_tokens as u32,
        })
    }
}

#[async_trait]
impl<M: CompletionModel> LlmProvider for RigAdapter<M> {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .run(
                request.messages,
                Vec::new(),
                request.max_tokens,
                request.temperature,
            )
            .await?;
        Ok(CompletionResponse {
            content: response.content.unwrap_or_default(),
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
        })
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        self.run(
            request.messages,
            request.tools,
            request.max_tokens,
            request.temperature,
        )
        .await
    }
}

//! OpenAI chat completions backend.

use super::retry::RetryPolicy;
use super::{Message, Role, TextGenerator, ToolInvocation, ToolSpec};
use crate::config::GenerationSettings;
use crate::error::{RecapError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat-completions text generator with per-call timeout and bounded retries.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAIGenerator {
    /// Create a generator with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(&GenerationSettings::default())
    }

    /// Create a generator from configuration.
    pub fn with_config(settings: &GenerationSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_seconds))?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            retry: RetryPolicy {
                max_attempts: settings.max_attempts,
                initial_delay: Duration::from_millis(settings.retry_delay_ms),
            },
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one request, retrying transient failures, and return the first choice.
    async fn complete(&self, request: CreateChatCompletionRequest) -> Result<Message> {
        let client = &self.client;
        let request = &request;
        let response = self
            .retry
            .run("Chat completion", || async move {
                let response = client
                    .chat()
                    .create(request.clone())
                    .await
                    .map_err(|e| RecapError::OpenAI(e.to_string()))?;

                let choice = response
                    .choices
                    .into_iter()
                    .next()
                    .ok_or_else(|| RecapError::Generation("No response from model".to_string()))?;

                let content = choice.message.content.unwrap_or_default();
                let tool_calls: Vec<ToolInvocation> = choice
                    .message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|call| ToolInvocation {
                        id: call.id,
                        name: call.function.name,
                        arguments: call.function.arguments,
                    })
                    .collect();

                if content.trim().is_empty() && tool_calls.is_empty() {
                    return Err(RecapError::Generation("Empty response from model".to_string()));
                }

                Ok(Message::assistant_with_tools(content, tool_calls))
            })
            .await;

        response.map_err(|e| match e {
            RecapError::Generation(_) => e,
            other => RecapError::Generation(other.to_string()),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![to_request_message(&Message::user(prompt))?])
            .temperature(self.temperature)
            .build()
            .map_err(|e| RecapError::Generation(e.to_string()))?;

        let message = self.complete(request).await?;
        debug!("Generated {} chars", message.content.len());
        Ok(message.content)
    }

    #[instrument(skip(self, messages, tools), fields(model = %self.model, turns = messages.len()))]
    async fn generate_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Message> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if !tools.is_empty() {
            builder.tools(tools.iter().map(to_tool_definition).collect::<Vec<_>>());
        }
        let request = builder
            .build()
            .map_err(|e| RecapError::Generation(e.to_string()))?;

        let message = self.complete(request).await?;
        debug!("Assistant turn requested {} tool call(s)", message.tool_calls.len());
        Ok(message)
    }
}

/// Map a conversation turn onto the OpenAI request message type.
fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let build_err = |e: async_openai::error::OpenAIError| RecapError::Generation(e.to_string());

    let request = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(build_err)?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(build_err)?
            .into(),
        Role::Assistant => {
            let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
            if !message.content.is_empty() {
                builder.content(message.content.clone());
            }
            if !message.tool_calls.is_empty() {
                builder.tool_calls(
                    message
                        .tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            builder.build().map_err(build_err)?.into()
        }
        Role::Tool => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(message.tool_call_id.clone().unwrap_or_default())
            .content(message.content.clone())
            .build()
            .map_err(build_err)?
            .into(),
    };

    Ok(request)
}

fn to_tool_definition(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.parameters.clone()),
            strict: None,
        },
    }
}

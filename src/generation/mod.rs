//! Text generation abstraction.
//!
//! The workflow talks to a language model through [`TextGenerator`], using the
//! provider-neutral conversation types defined here. [`OpenAIGenerator`] maps
//! them onto the chat completions API.

mod openai;
mod retry;

pub use openai::OpenAIGenerator;
pub use retry::RetryPolicy;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Provider-assigned id, echoed back on the tool turn.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tools requested by an assistant turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
    /// Invocation answered by a tool turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Name of the tool that produced a tool turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant turn that requests tools.
    pub fn assistant_with_tools(
        content: impl Into<String>,
        tool_calls: Vec<ToolInvocation>,
    ) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Tool turn answering `invocation`.
    pub fn tool(invocation: &ToolInvocation, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(invocation.id.clone()),
            name: Some(invocation.name.clone()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// Whether this is an assistant turn with pending tool calls.
    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// A function the model may call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// Trait for text generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate plain text for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Produce the next assistant turn for a conversation; the turn may request tools.
    async fn generate_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Message>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_turn_links_invocation() {
        let invocation = ToolInvocation {
            id: "call_1".to_string(),
            name: "find_video".to_string(),
            arguments: r#"{"title": "cats"}"#.to_string(),
        };
        let turn = Message::tool(&invocation, "null");
        assert_eq!(turn.role, Role::Tool);
        assert_eq!(turn.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(turn.name.as_deref(), Some("find_video"));
        assert!(!turn.requests_tools());
    }

    #[test]
    fn test_requests_tools() {
        assert!(!Message::assistant("done").requests_tools());
        let turn = Message::assistant_with_tools(
            "",
            vec![ToolInvocation {
                id: "a".to_string(),
                name: "fetch_transcript".to_string(),
                arguments: "{}".to_string(),
            }],
        );
        assert!(turn.requests_tools());
    }

    #[test]
    fn test_message_serialization_omits_empty_fields() {
        let json = serde_json::to_value(Message::user("cats")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "user", "content": "cats" }));
    }
}

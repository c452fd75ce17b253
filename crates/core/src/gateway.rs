//! Model gateway trait: the abstraction over chat-completion backends.
//!
//! A gateway takes the conversation and the advertised tool schemas and
//! returns text, tool-call requests, or both. Wire formats are the
//! implementation's business.
//!
//! Implementations: Ollama native, OpenAI-compatible endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::message::{Message, ToolCallRequest};
use crate::tool::ToolSchema;

/// One completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "qwen3_14b_q6k:latest")
    pub model: String,

    /// The conversation snapshot, in order
    pub messages: Vec<Message>,

    /// Tools the model may call. `None` disables tool calling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSchema>>,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A complete response from a gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Free-text content (may be empty)
    #[serde(default)]
    pub content: String,

    /// Requested tool calls, in the order the model emitted them
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Which model actually responded
    #[serde(default)]
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// A text-only response.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// A response requesting tool calls, with optional accompanying text.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            ..Self::default()
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core gateway trait.
///
/// The agent loop calls `complete()` without knowing which backend is behind
/// it. Failures are never retried by the caller.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// A human-readable name for this gateway (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, GatewayError>;

    /// Health check: can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, GatewayError> {
        Ok(true)
    }
}

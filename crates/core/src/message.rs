//! Message and conversation domain types.
//!
//! The [`ConversationStore`] is the exact context window sent to the model on
//! every turn. It is append-only: messages are validated on the way in and
//! never reordered or edited afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Task-mode instructions
    System,
    /// The human, or the framed task
    User,
    /// The model
    Assistant,
    /// Tool execution result
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            other => Err(Error::InvalidMessage(format!("unknown role '{other}'"))),
        }
    }
}

/// A structured tool invocation requested by the model inside an assistant turn.
///
/// Consumed exactly once by the dispatcher; afterwards only the resulting
/// `tool` message remains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Backend-assigned call ID (synthesised when the backend has none)
    pub id: String,

    /// Name of the tool to invoke
    pub tool_name: String,

    /// Arguments, normally a JSON object keyed by parameter name
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCallRequest {
    pub fn new(tool_name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let tool_name = tool_name.into();
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            tool_name,
            arguments,
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content (may be empty for assistant tool-call turns)
    pub content: String,

    /// The tool that produced this message. Set iff `role` is `tool`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// For tool results: the call this result answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// For assistant turns: the tool calls requested in that turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create an assistant message that carries tool-call requests.
    pub fn assistant_with_calls(content: impl Into<String>, calls: Vec<ToolCallRequest>) -> Self {
        let mut msg = Self::with_role(Role::Assistant, content);
        msg.tool_calls = calls;
        msg
    }

    /// Create a tool result message.
    pub fn tool_result(
        tool_name: impl Into<String>,
        tool_call_id: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_name = Some(tool_name.into());
        msg.tool_call_id = tool_call_id;
        msg
    }
}

/// Ordered, append-only log of role-tagged messages.
///
/// Owned by whoever runs a task; the agent loop resets it at the start of a
/// task and the dispatcher only appends to it.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every message. Called once per new task.
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Append one message built from its parts.
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        tool_name: Option<&str>,
    ) -> Result<&Message> {
        let mut msg = Message::with_role(role, content);
        msg.tool_name = tool_name.map(str::to_string);
        self.append_message(msg)
    }

    /// Validate and append a fully-formed message.
    pub fn append_message(&mut self, message: Message) -> Result<&Message> {
        self.validate(&message)?;
        self.messages.push(message);
        Ok(&self.messages[self.messages.len() - 1])
    }

    fn validate(&self, message: &Message) -> Result<()> {
        match message.role {
            Role::Tool => {
                if message.tool_name.as_deref().is_none_or(|n| n.trim().is_empty()) {
                    return Err(Error::InvalidMessage(
                        "tool message requires a tool_name".into(),
                    ));
                }
                self.check_requested(message)?;
            }
            role => {
                if message.tool_name.is_some() {
                    return Err(Error::InvalidMessage(format!(
                        "tool_name is only allowed on tool messages, not {role}"
                    )));
                }
            }
        }

        if !message.tool_calls.is_empty() && message.role != Role::Assistant {
            return Err(Error::InvalidMessage(
                "only assistant messages may carry tool calls".into(),
            ));
        }

        Ok(())
    }

    /// A tool result must answer a call made by the latest assistant turn.
    fn check_requested(&self, message: &Message) -> Result<()> {
        let Some(turn) = self.messages.iter().rev().find(|m| m.role == Role::Assistant) else {
            return Err(Error::InvalidMessage(
                "tool message must follow an assistant message".into(),
            ));
        };

        let tool_name = message.tool_name.as_deref().unwrap_or_default();
        let requested = turn.tool_calls.iter().any(|call| {
            call.tool_name == tool_name
                && message.tool_call_id.as_deref().is_none_or(|id| id == call.id)
        });
        if requested {
            Ok(())
        } else {
            Err(Error::InvalidMessage(format!(
                "tool message for '{tool_name}' answers no call of the preceding assistant turn"
            )))
        }
    }

    /// The full ordered sequence, exactly as sent to the model gateway.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

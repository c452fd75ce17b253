//! Tool dispatch: turn the model's tool-call requests into `tool` messages.
//!
//! Calls run one after another in the order the model emitted them, so side
//! effects on the workspace happen in a deterministic order. Whatever a tool
//! does (fail, reject its arguments, panic) ends up as text in the
//! conversation; only a conversation-contract violation escapes.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use opencursor_core::error::{Result, ToolError};
use opencursor_core::event::{DomainEvent, EventBus};
use opencursor_core::message::{ConversationStore, Message, ToolCallRequest};
use opencursor_core::tool::{ToolArguments, ToolOutput, ToolRegistry};
use serde_json::Value;
use tracing::{debug, warn};

/// What one tool call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    pub tool_name: String,
    /// Exactly the text appended to the conversation
    pub output: String,
    /// Short description for the execution log
    pub label: String,
    pub success: bool,
}

pub struct ToolDispatcher {
    tools: Arc<ToolRegistry>,
    event_bus: Option<Arc<EventBus>>,
}

impl ToolDispatcher {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self {
            tools,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Run every request in order, appending one `tool` message per request.
    ///
    /// Tool failures never surface as `Err`; the only error is an append the
    /// conversation store refuses (e.g. the preceding assistant turn did not
    /// request the call).
    pub async fn dispatch(
        &self,
        requests: Vec<ToolCallRequest>,
        conversation: &mut ConversationStore,
    ) -> Result<Vec<DispatchResult>> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            let label = describe(&request);
            self.publish(DomainEvent::ToolStarted {
                tool_name: request.tool_name.clone(),
                summary: label.clone(),
                timestamp: Utc::now(),
            });

            let start = Instant::now();
            let outcome = self.execute(&request).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (output, success) = match outcome {
                Ok(output) => (output.to_text(), true),
                Err(ToolError::NotFound(name)) => {
                    warn!(tool = %name, "Model requested an unknown tool");
                    (ToolError::NotFound(name).to_string(), false)
                }
                Err(e) => {
                    warn!(tool = %request.tool_name, error = %e, "Tool execution failed");
                    (format!("Error executing {}: {e}", request.tool_name), false)
                }
            };
            debug!(tool = %request.tool_name, success, duration_ms, "Tool call finished");

            self.publish(DomainEvent::ToolExecuted {
                tool_name: request.tool_name.clone(),
                success,
                duration_ms,
                timestamp: Utc::now(),
            });

            conversation.append_message(Message::tool_result(
                request.tool_name.clone(),
                Some(request.id.clone()),
                output.clone(),
            ))?;

            results.push(DispatchResult {
                tool_name: request.tool_name,
                output,
                label,
                success,
            });
        }

        Ok(results)
    }

    async fn execute(
        &self,
        request: &ToolCallRequest,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .resolve(&request.tool_name)
            .ok_or_else(|| ToolError::NotFound(request.tool_name.clone()))?;
        let arguments = to_arguments(&request.arguments)?;

        AssertUnwindSafe(tool.call(arguments))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ToolError::Panicked(panic_message(payload.as_ref()))))
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}

/// Arguments are passed through unchecked; only their outer shape matters here.
fn to_arguments(raw: &Value) -> std::result::Result<ToolArguments, ToolError> {
    match raw {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(ToolArguments::new()),
        Value::String(s) if s.trim().is_empty() => Ok(ToolArguments::new()),
        Value::String(s) => Err(ToolError::InvalidArguments(format!(
            "arguments are not valid JSON: {s}"
        ))),
        _ => Err(ToolError::InvalidArguments(
            "arguments must be a JSON object".into(),
        )),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Human-readable label for the execution log.
pub fn describe(request: &ToolCallRequest) -> String {
    let arg = |key: &str| -> Option<String> {
        match request.arguments.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    };

    let label = match request.tool_name.as_str() {
        "read_file" => arg("target_file").map(|p| format!("Reading file {p}")),
        "edit_file" => arg("target_file").map(|p| format!("Editing file {p}")),
        "delete_file" => arg("target_file").map(|p| format!("Deleting file {p}")),
        "list_dir" => Some(format!(
            "Listing directory {}",
            arg("directory").unwrap_or_else(|| ".".into())
        )),
        "search_replace" => arg("file_path").map(|p| format!("Replacing text in {p}")),
        "run_terminal_cmd" => arg("command").map(|c| format!("Running command {c}")),
        "grep_search" => arg("query").map(|q| format!("Searching code for '{q}'")),
        "file_search" => arg("query").map(|q| format!("Finding files matching '{q}'")),
        "list_code_usages" => arg("symbol_name").map(|s| format!("Finding usages of {s}")),
        "diff_history" => Some("Reviewing recent changes".into()),
        "web_search" => arg("search_term").map(|q| format!("Searching the web for '{q}'")),
        "fetch_webpage" => match request.arguments.get("urls") {
            Some(Value::Array(urls)) => Some(format!(
                "Fetching {}",
                urls.iter()
                    .map(|u| u.as_str().map(str::to_string).unwrap_or_else(|| u.to_string()))
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            _ => arg("urls").map(|u| format!("Fetching {u}")),
        },
        "add_two_numbers" => arg("a")
            .zip(arg("b"))
            .map(|(a, b)| format!("Adding {a} and {b}")),
        "subtract_two_numbers" => arg("a")
            .zip(arg("b"))
            .map(|(a, b)| format!("Subtracting {b} from {a}")),
        _ => None,
    };

    label.unwrap_or_else(|| format!("{}...", request.tool_name))
}

//! Native Ollama gateway (`POST /api/chat`).
//!
//! Ollama returns tool-call arguments as JSON objects and never assigns call
//! IDs, so IDs are synthesised here. Tool results are sent back with
//! `tool_name` so the model can tell them apart.

use async_trait::async_trait;
use opencursor_core::error::GatewayError;
use opencursor_core::gateway::{CompletionRequest, CompletionResponse, ModelGateway, Usage};
use opencursor_core::message::{Message, ToolCallRequest};
use opencursor_core::tool::ToolSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::parse_arguments;

pub struct OllamaGateway {
    host: String,
    client: reqwest::Client,
}

impl OllamaGateway {
    pub fn new(host: impl Into<String>) -> Self {
        // Local models can take minutes on the first request while loading.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(600))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            host: host.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn to_api_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|m| OllamaMessage {
                role: m.role.as_str().into(),
                content: m.content.clone(),
                tool_calls: m
                    .tool_calls
                    .iter()
                    .map(|tc| OllamaToolCall {
                        function: OllamaFunction {
                            name: tc.tool_name.clone(),
                            arguments: tc.arguments.clone(),
                        },
                    })
                    .collect(),
                tool_name: m.tool_name.clone(),
            })
            .collect()
    }

    fn to_api_tools(tools: &[ToolSchema]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.to_json_schema(),
                    }
                })
            })
            .collect()
    }

    fn from_api_response(resp: OllamaChatResponse) -> CompletionResponse {
        let tool_calls = resp
            .message
            .tool_calls
            .into_iter()
            .map(|tc| {
                let arguments = match tc.function.arguments {
                    serde_json::Value::String(s) => parse_arguments(&s),
                    serde_json::Value::Null => serde_json::json!({}),
                    other => other,
                };
                ToolCallRequest::new(tc.function.name, arguments)
            })
            .collect();

        let usage = match (resp.prompt_eval_count, resp.eval_count) {
            (None, None) => None,
            (p, c) => {
                let prompt_tokens = p.unwrap_or(0);
                let completion_tokens = c.unwrap_or(0);
                Some(Usage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: prompt_tokens + completion_tokens,
                })
            }
        };

        CompletionResponse {
            content: resp.message.content,
            tool_calls,
            model: resp.model,
            usage,
        }
    }
}

#[async_trait]
impl ModelGateway for OllamaGateway {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, GatewayError> {
        let url = format!("{}/api/chat", self.host);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": false,
        });

        if let Some(temperature) = request.temperature {
            body["options"] = serde_json::json!({ "temperature": temperature });
        }

        if let Some(tools) = request.tools.as_deref()
            && !tools.is_empty()
        {
            body["tools"] = serde_json::json!(Self::to_api_tools(tools));
        }

        debug!(host = %self.host, model = %request.model, "Sending Ollama chat request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 404 {
            return Err(GatewayError::ModelNotFound(format!(
                "{} (try `ollama pull {}`)",
                request.model, request.model
            )));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Ollama returned error");
            return Err(GatewayError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        Ok(Self::from_api_response(api_response))
    }

    async fn health_check(&self) -> std::result::Result<bool, GatewayError> {
        let url = format!("{}/api/tags", self.host);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- Ollama API types ---

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: String,
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_trailing_slash_trimmed() {
        let g = OllamaGateway::new("http://localhost:11434/");
        assert_eq!(g.host, "http://localhost:11434");
        assert_eq!(g.name(), "ollama");
    }

    #[test]
    fn tool_messages_carry_tool_name() {
        let messages = vec![
            Message::assistant_with_calls(
                "",
                vec![ToolCallRequest::new(
                    "add_two_numbers",
                    serde_json::json!({"a": 2, "b": 2}),
                )],
            ),
            Message::tool_result("add_two_numbers", None, "4"),
        ];
        let api = OllamaGateway::to_api_messages(&messages);
        let json = serde_json::to_value(&api).unwrap();

        assert_eq!(json[0]["tool_calls"][0]["function"]["arguments"]["a"], 2);
        assert!(json[0].get("tool_name").is_none());
        assert_eq!(json[1]["role"], "tool");
        assert_eq!(json[1]["tool_name"], "add_two_numbers");
        assert!(json[1].get("tool_calls").is_none());
    }

    #[test]
    fn response_with_object_arguments() {
        let body = r#"{
            "model": "qwen3_14b_q6k:latest",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{"function": {"name": "list_dir", "arguments": {"directory": "."}}}]
            },
            "done": true,
            "prompt_eval_count": 120,
            "eval_count": 30
        }"#;
        let api: OllamaChatResponse = serde_json::from_str(body).unwrap();
        let resp = OllamaGateway::from_api_response(api);

        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].tool_name, "list_dir");
        assert_eq!(resp.tool_calls[0].arguments["directory"], ".");
        assert!(resp.tool_calls[0].id.starts_with("call_"));
        assert_eq!(resp.usage.unwrap().total_tokens, 150);
    }

    #[test]
    fn response_with_string_arguments_is_parsed() {
        let body = r#"{
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "function": {
                        "name": "add_two_numbers",
                        "arguments": "{\"a\": 1, \"b\": 3}"
                    }
                }]
            }
        }"#;
        let api: OllamaChatResponse = serde_json::from_str(body).unwrap();
        let resp = OllamaGateway::from_api_response(api);
        assert_eq!(resp.tool_calls[0].arguments["b"], 3);
        assert!(resp.usage.is_none());
    }

    #[test]
    fn text_response() {
        let body = r#"{"model":"m","message":{"role":"assistant","content":"The result is 4"}}"#;
        let api: OllamaChatResponse = serde_json::from_str(body).unwrap();
        let resp = OllamaGateway::from_api_response(api);
        assert_eq!(resp.content, "The result is 4");
        assert!(!resp.has_tool_calls());
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let g = OllamaGateway::new("http://127.0.0.1:9");
        let req = CompletionRequest {
            model: "m".into(),
            messages: vec![Message::user("hi")],
            tools: None,
            temperature: Some(0.7),
        };
        assert!(matches!(
            g.complete(req).await,
            Err(GatewayError::Network(_))
        ));
    }
}

//! Shared test helpers for agent tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use opencursor_core::error::GatewayError;
use opencursor_core::gateway::{CompletionRequest, CompletionResponse, ModelGateway, Usage};
use opencursor_core::message::ToolCallRequest;
use opencursor_core::tool::ToolRegistry;
use opencursor_tools::math::{AddTwoNumbersTool, SubtractTwoNumbersTool};

/// A mock gateway that returns a sequence of scripted responses and records
/// every request it receives.
///
/// Panics if more calls are made than responses provided, unless built with
/// [`SequentialMockGateway::repeating`].
pub struct SequentialMockGateway {
    responses: Mutex<VecDeque<CompletionResponse>>,
    repeat: Option<CompletionResponse>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl SequentialMockGateway {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with the same response.
    pub fn repeating(response: CompletionResponse) -> Self {
        Self {
            repeat: Some(response),
            ..Self::new(vec![])
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ModelGateway for SequentialMockGateway {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, GatewayError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        let next = self.responses.lock().unwrap().pop_front();
        let mut response = next
            .or_else(|| self.repeat.clone())
            .unwrap_or_else(|| panic!("SequentialMockGateway: nothing scripted for call #{call}"));
        response.model = "mock-model".into();
        response.usage = Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        Ok(response)
    }
}

/// A gateway whose backend is always down.
pub struct FailingGateway;

#[async_trait::async_trait]
impl ModelGateway for FailingGateway {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, GatewayError> {
        Err(GatewayError::Network("connection refused".into()))
    }

    async fn health_check(&self) -> Result<bool, GatewayError> {
        Err(GatewayError::Network("connection refused".into()))
    }
}

/// Registry holding the two arithmetic tools.
pub fn adder_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register_tool(Arc::new(AddTwoNumbersTool)).unwrap();
    registry
        .register_tool(Arc::new(SubtractTwoNumbersTool))
        .unwrap();
    Arc::new(registry)
}

pub fn tool_call(name: &str, args: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest::new(name, args)
}

//! The agent loop: alternate model turns and tool dispatch until the model
//! answers without tool calls or the iteration cap is reached.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use opencursor_core::agent::{AgentState, AgentTask, DoneReason, TaskMode};
use opencursor_core::error::{Error, Result};
use opencursor_core::event::{DomainEvent, EventBus};
use opencursor_core::gateway::{CompletionRequest, CompletionResponse, ModelGateway};
use opencursor_core::message::{ConversationStore, Message, Role, ToolCallRequest};
use opencursor_core::tool::{ToolRegistry, ToolSchema};
use tracing::{debug, info, warn};

use crate::dispatcher::{DispatchResult, ToolDispatcher};
use crate::prompts;

/// Sent when the model ends a task with neither text nor tool calls.
pub const SUMMARY_FOLLOW_UP: &str =
    "Now that you've completed the task, provide a summary of what you've done.";

const DEFAULT_MAX_ITERATIONS: u32 = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionLogEntry {
    pub step_index: u32,
    pub description: String,
}

/// Per-task record of what happened at each step. Cosmetic only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionLog {
    entries: Vec<ExecutionLogEntry>,
}

impl ExecutionLog {
    pub fn record(&mut self, step_index: u32, description: impl Into<String>) {
        self.entries.push(ExecutionLogEntry {
            step_index,
            description: description.into(),
        });
    }

    pub fn entries(&self) -> &[ExecutionLogEntry] {
        &self.entries
    }
}

impl fmt::Display for ExecutionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[Execution Summary]")?;
        for entry in &self.entries {
            write!(f, "\nStep {}: {}", entry.step_index, entry.description)?;
        }
        Ok(())
    }
}

/// How an autonomous task ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The model produced a final answer.
    Success {
        answer: String,
        log: ExecutionLog,
        iterations: u32,
    },
    /// The iteration cap was hit first.
    Capped { log: ExecutionLog, iterations: u32 },
}

impl TaskOutcome {
    pub fn is_capped(&self) -> bool {
        matches!(self, TaskOutcome::Capped { .. })
    }

    /// The model's final answer, without the execution summary.
    pub fn answer(&self) -> Option<&str> {
        match self {
            TaskOutcome::Success { answer, .. } => Some(answer),
            TaskOutcome::Capped { .. } => None,
        }
    }

    pub fn log(&self) -> &ExecutionLog {
        match self {
            TaskOutcome::Success { log, .. } | TaskOutcome::Capped { log, .. } => log,
        }
    }

    pub fn iterations(&self) -> u32 {
        match self {
            TaskOutcome::Success { iterations, .. } | TaskOutcome::Capped { iterations, .. } => {
                *iterations
            }
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Success { answer, log, .. } => write!(f, "{answer}\n\n{log}"),
            TaskOutcome::Capped { log, iterations } => write!(
                f,
                "I've reached the maximum number of steps ({iterations}) without completing \
                 the task. Here's what I've done so far:\n\n{log}"
            ),
        }
    }
}

/// The single model turn of an interactive task.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractivePlan {
    pub content: String,
    /// Tool calls awaiting approval, in the order the model proposed them
    pub proposed_calls: Vec<ToolCallRequest>,
}

impl fmt::Display for InteractivePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content.trim())?;
        if self.proposed_calls.is_empty() {
            return Ok(());
        }
        if !self.content.trim().is_empty() {
            f.write_str("\n\n")?;
        }
        f.write_str("Proposed tool calls:")?;
        for (i, call) in self.proposed_calls.iter().enumerate() {
            write!(f, "\n{}. {}({})", i + 1, call.tool_name, call.arguments)?;
        }
        Ok(())
    }
}

/// Result of [`AgentLoop::run`], depending on the task mode.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskReport {
    Completed(TaskOutcome),
    Planned(InteractivePlan),
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskReport::Completed(outcome) => outcome.fmt(f),
            TaskReport::Planned(plan) => plan.fmt(f),
        }
    }
}

/// Orchestrates model calls and tool dispatch for one task at a time.
///
/// The conversation is owned by the caller and passed into every task entry
/// point; each task resets it before seeding the system and user messages.
pub struct AgentLoop {
    gateway: Arc<dyn ModelGateway>,
    dispatcher: ToolDispatcher,
    model: String,
    temperature: Option<f32>,
    max_iterations: u32,
    event_bus: Option<Arc<EventBus>>,
    state: AgentState,
}

impl AgentLoop {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            dispatcher: ToolDispatcher::new(tools),
            model: model.into(),
            temperature: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            event_bus: None,
            state: AgentState::Idle,
        }
    }

    /// Set the maximum number of model turns per autonomous task (at least 1).
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Publish progress events to `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.dispatcher = self.dispatcher.with_event_bus(Arc::clone(&bus));
        self.event_bus = Some(bus);
        self
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        self.dispatcher.tools()
    }

    /// Run `task` in its own mode.
    pub async fn run(
        &mut self,
        task: AgentTask,
        conversation: &mut ConversationStore,
    ) -> Result<TaskReport> {
        match task.mode {
            TaskMode::Autonomous => self
                .run_autonomous(conversation, &task.instructions)
                .await
                .map(TaskReport::Completed),
            TaskMode::Interactive => self
                .run_interactive(conversation, &task.instructions)
                .await
                .map(TaskReport::Planned),
        }
    }

    /// Loop until the model gives a final answer or the cap is reached.
    ///
    /// A gateway failure aborts the task with `Err`; reaching the cap does
    /// not, it yields [`TaskOutcome::Capped`].
    pub async fn run_autonomous(
        &mut self,
        conversation: &mut ConversationStore,
        instructions: &str,
    ) -> Result<TaskOutcome> {
        let task = AgentTask::autonomous(instructions);
        let schemas = self.tools().all_schemas();
        self.begin(conversation, &task, &schemas)?;

        let mut log = ExecutionLog::default();

        for iteration in 1..=self.max_iterations {
            self.transition(AgentState::AwaitingModel);
            let response = self
                .request(conversation, Some(schemas.clone()), iteration)
                .await
                .inspect_err(|_| self.state = AgentState::Idle)?;

            if response.has_tool_calls() {
                // Text next to tool calls is interim narration, never the answer.
                let calls = response.tool_calls;
                conversation.append_message(Message::assistant_with_calls(
                    response.content,
                    calls.clone(),
                ))?;

                self.transition(AgentState::Dispatching);
                let results = self.dispatcher.dispatch(calls, conversation).await?;
                log.record(iteration, step_description(&results));
                continue;
            }

            log.record(iteration, "Final response");

            let answer = if response.content.trim().is_empty() {
                debug!(iteration, "Empty final turn, asking for a summary");
                conversation.append(Role::User, SUMMARY_FOLLOW_UP, None)?;
                self.transition(AgentState::AwaitingModel);
                self.request(conversation, None, iteration)
                    .await
                    .inspect_err(|_| self.state = AgentState::Idle)?
                    .content
            } else {
                response.content
            };

            conversation.append(Role::Assistant, answer.clone(), None)?;
            self.finish(DoneReason::Success, iteration);
            return Ok(TaskOutcome::Success {
                answer,
                log,
                iterations: iteration,
            });
        }

        warn!(
            max_iterations = self.max_iterations,
            "Iteration cap reached without a final answer"
        );
        self.finish(DoneReason::Capped, self.max_iterations);
        Ok(TaskOutcome::Capped {
            log,
            iterations: self.max_iterations,
        })
    }

    /// One model turn; proposed tool calls are returned, not executed.
    pub async fn run_interactive(
        &mut self,
        conversation: &mut ConversationStore,
        instructions: &str,
    ) -> Result<InteractivePlan> {
        let task = AgentTask::interactive(instructions);
        let schemas = self.tools().all_schemas();
        self.begin(conversation, &task, &schemas)?;

        self.transition(AgentState::AwaitingModel);
        let response = self
            .request(conversation, Some(schemas), 1)
            .await
            .inspect_err(|_| self.state = AgentState::Idle)?;

        conversation.append_message(Message::assistant_with_calls(
            response.content.clone(),
            response.tool_calls.clone(),
        ))?;
        self.finish(DoneReason::Success, 1);

        Ok(InteractivePlan {
            content: response.content,
            proposed_calls: response.tool_calls,
        })
    }

    /// Execute one proposed call the user approved.
    ///
    /// `call` must be one the latest assistant turn proposed and that has not
    /// been executed yet; anything else is rejected before the tool runs.
    pub async fn execute_approved(
        &mut self,
        conversation: &mut ConversationStore,
        call: ToolCallRequest,
    ) -> Result<DispatchResult> {
        if !is_pending(conversation, &call) {
            return Err(Error::InvalidMessage(format!(
                "{} ({}) is not a pending proposed call",
                call.tool_name, call.id
            )));
        }

        self.transition(AgentState::Dispatching);
        let mut results = self.dispatcher.dispatch(vec![call], conversation).await?;
        self.transition(AgentState::Done(DoneReason::Success));
        results
            .pop()
            .ok_or_else(|| Error::Internal("dispatch returned no result".into()))
    }

    /// Talk to the model directly, without tools, continuing `conversation`.
    pub async fn chat(
        &mut self,
        conversation: &mut ConversationStore,
        message: &str,
    ) -> Result<String> {
        conversation.append(Role::User, message, None)?;
        self.transition(AgentState::AwaitingModel);
        let reply = self
            .request(conversation, None, 1)
            .await
            .inspect_err(|_| self.state = AgentState::Idle)?
            .content;
        conversation.append(Role::Assistant, reply.clone(), None)?;
        self.transition(AgentState::Idle);
        Ok(reply)
    }

    /// Whether the model backend answers its health check.
    pub async fn backend_reachable(&self) -> bool {
        match self.gateway.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                debug!(error = %e, "Backend health check failed");
                false
            }
        }
    }

    fn begin(
        &mut self,
        conversation: &mut ConversationStore,
        task: &AgentTask,
        schemas: &[ToolSchema],
    ) -> Result<()> {
        self.state = AgentState::Idle;
        conversation.reset();
        conversation.append(Role::System, prompts::system_prompt(task.mode, schemas), None)?;
        conversation.append(Role::User, task.framed(), None)?;

        info!(mode = ?task.mode, model = %self.model, tools = schemas.len(), "Task started");
        self.publish(DomainEvent::TaskStarted {
            mode: task.mode,
            instructions_preview: task.instructions.chars().take(80).collect(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn request(
        &self,
        conversation: &ConversationStore,
        tools: Option<Vec<ToolSchema>>,
        iteration: u32,
    ) -> Result<CompletionResponse> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: conversation.snapshot().to_vec(),
            tools,
            temperature: self.temperature,
        };

        let response = self.gateway.complete(request).await.map_err(|e| {
            warn!(gateway = %self.gateway.name(), error = %e, "Model gateway call failed");
            Error::from(e)
        })?;

        debug!(
            iteration,
            tool_calls = response.tool_calls.len(),
            content_len = response.content.len(),
            "Model responded"
        );
        self.publish(DomainEvent::ResponseGenerated {
            iteration,
            model: response.model.clone(),
            tool_calls: response.tool_calls.len(),
            tokens_used: response.usage.as_ref().map(|u| u.total_tokens),
            timestamp: Utc::now(),
        });
        Ok(response)
    }

    fn transition(&mut self, next: AgentState) {
        debug!(from = ?self.state, to = ?next, "Agent state");
        self.state = next;
    }

    fn finish(&mut self, reason: DoneReason, iterations: u32) {
        self.transition(AgentState::Done(reason));
        info!(reason = ?reason, iterations, "Task finished");
        self.publish(DomainEvent::TaskFinished {
            reason,
            iterations,
            timestamp: Utc::now(),
        });
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}

fn step_description(results: &[DispatchResult]) -> String {
    results
        .iter()
        .map(|r| r.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Proposed by the latest assistant turn and not answered since.
fn is_pending(conversation: &ConversationStore, call: &ToolCallRequest) -> bool {
    let messages = conversation.snapshot();
    let Some(turn) = messages.iter().rposition(|m| m.role == Role::Assistant) else {
        return false;
    };
    let proposed = messages[turn]
        .tool_calls
        .iter()
        .any(|c| c.id == call.id && c.tool_name == call.tool_name);
    let answered = messages[turn + 1..]
        .iter()
        .any(|m| m.tool_call_id.as_deref() == Some(call.id.as_str()));
    proposed && !answered
}

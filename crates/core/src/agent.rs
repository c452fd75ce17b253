//! Task and agent-state types.

use serde::{Deserialize, Serialize};

/// How a task is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    /// Loop until the model stops calling tools; never ask the user anything
    #[default]
    Autonomous,
    /// One model call; the caller approves each proposed tool call
    Interactive,
}

/// One end-to-end request to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTask {
    pub instructions: String,
    pub mode: TaskMode,
}

impl AgentTask {
    pub fn autonomous(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            mode: TaskMode::Autonomous,
        }
    }

    pub fn interactive(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            mode: TaskMode::Interactive,
        }
    }

    /// The user message that opens the conversation.
    pub fn framed(&self) -> String {
        format!("Task: {}", self.instructions)
    }
}

/// How a finished task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoneReason {
    Success,
    Capped,
}

/// Where the agent loop currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum AgentState {
    #[default]
    Idle,
    AwaitingModel,
    Dispatching,
    Done(DoneReason),
}

impl AgentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentState::Done(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_starts_idle() {
        assert_eq!(AgentState::default(), AgentState::Idle);
        assert!(!AgentState::Idle.is_terminal());
        assert!(AgentState::Done(DoneReason::Capped).is_terminal());
    }

    #[test]
    fn task_framing() {
        let task = AgentTask::autonomous("Add 2 and 2");
        assert_eq!(task.framed(), "Task: Add 2 and 2");
        assert_eq!(task.mode, TaskMode::Autonomous);
        assert_eq!(AgentTask::interactive("x").mode, TaskMode::Interactive);
    }

    #[test]
    fn state_serializes_with_reason() {
        let json = serde_json::to_string(&AgentState::Done(DoneReason::Success)).unwrap();
        assert!(json.contains("done"));
        assert!(json.contains("success"));
    }
}

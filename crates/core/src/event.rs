//! Domain event system: progress notifications out of the agent loop.
//!
//! The loop publishes events as it works; the terminal front-end subscribes
//! to render live progress without the loop knowing anything about output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::agent::{DoneReason, TaskMode};

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A task was accepted and the conversation reset
    TaskStarted {
        mode: TaskMode,
        instructions_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// The gateway answered one turn
    ResponseGenerated {
        iteration: u32,
        model: String,
        tool_calls: usize,
        tokens_used: Option<u32>,
        timestamp: DateTime<Utc>,
    },

    /// A tool call is about to run
    ToolStarted {
        tool_name: String,
        summary: String,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The loop reached a terminal state
    TaskFinished {
        reason: DoneReason,
        iterations: u32,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

//! # OpenCursor Core
//!
//! Domain types, traits, and error definitions for the OpenCursor coding
//! agent. This crate has **no I/O**: it defines the model every other crate
//! implements against.
//!
//! ## Design Philosophy
//!
//! Each seam is a trait here, implemented elsewhere:
//! - [`ModelGateway`]: chat-completion backends (`opencursor-providers`)
//! - [`Tool`]: capabilities exposed to the model (`opencursor-tools`)
//!
//! Stub implementations of both are all a test needs to drive the agent loop.

pub mod agent;
pub mod error;
pub mod event;
pub mod gateway;
pub mod message;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentState, AgentTask, DoneReason, TaskMode};
pub use error::{Error, ErrorKind, GatewayError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use gateway::{CompletionRequest, CompletionResponse, ModelGateway, Usage};
pub use message::{ConversationStore, Message, Role, ToolCallRequest};
pub use tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolRegistry, ToolSchema};

//! The agent loop and tool dispatch for OpenCursor.
//!
//! An autonomous task runs a **model → tools → model** cycle:
//!
//! 1. **Reset** the caller's conversation, seed the mode's system prompt and
//!    the framed task (`Task: ...`)
//! 2. **Ask the model** with every registered tool schema
//! 3. **If tool calls**: dispatch them in order, append the results, loop
//! 4. **If text**: that is the final answer, returned with an execution summary
//!
//! The loop stops at the first turn without tool calls or when the iteration
//! cap is reached. Interactive tasks stop after one turn and hand the proposed
//! calls back to the caller for approval.

pub mod dispatcher;
pub mod loop_runner;
pub mod prompts;

#[cfg(test)]
mod test_helpers;

pub use dispatcher::{DispatchResult, ToolDispatcher};
pub use loop_runner::{
    AgentLoop, ExecutionLog, ExecutionLogEntry, InteractivePlan, SUMMARY_FOLLOW_UP, TaskOutcome,
    TaskReport,
};

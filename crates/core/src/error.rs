//! Error types for the OpenCursor domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! The model gateway and the tools each have their own bounded-context enum;
//! everything converges on [`Error`], which can be classified with
//! [`Error::kind`].

use thiserror::Error;

/// The top-level error type for all OpenCursor operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model gateway errors ---
    #[error("Model gateway unavailable: {0}")]
    Gateway(#[from] GatewayError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Conversation contract violations ---
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    // --- Registry errors ---
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Schema mismatch for tool '{tool}': {reason}")]
    SchemaMismatch { tool: String, reason: String },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of failures, independent of where they were raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The model backend could not be reached or answered with garbage.
    GatewayUnavailable,
    /// A requested tool name is not registered.
    ToolNotFound,
    /// A tool's implementation failed.
    ToolExecutionFailure,
    /// A malformed append to the conversation store.
    InvalidMessage,
    /// Registration reused an existing tool name.
    DuplicateTool,
    /// Configuration or registration-time schema problem.
    Configuration,
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Gateway(_) => ErrorKind::GatewayUnavailable,
            Error::Tool(ToolError::NotFound(_)) => ErrorKind::ToolNotFound,
            Error::Tool(_) => ErrorKind::ToolExecutionFailure,
            Error::InvalidMessage(_) => ErrorKind::InvalidMessage,
            Error::DuplicateTool(_) => ErrorKind::DuplicateTool,
            Error::SchemaMismatch { .. } | Error::Config { .. } => ErrorKind::Configuration,
            Error::Serialization(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures raised inside a tool. The dispatcher turns these into text.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Function {0} not found")]
    NotFound(String),

    #[error("{0}")]
    InvalidArguments(String),

    #[error("{reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("permission denied: {reason}")]
    PermissionDenied { tool_name: String, reason: String },

    #[error("tool panicked: {0}")]
    Panicked(String),
}

impl ToolError {
    /// Shorthand for an execution failure.
    pub fn failed(tool_name: &str, reason: impl std::fmt::Display) -> Self {
        ToolError::ExecutionFailed {
            tool_name: tool_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a missing required argument.
    pub fn missing_argument(name: &str) -> Self {
        ToolError::InvalidArguments(format!("missing required argument '{name}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_error_displays_correctly() {
        let err = Error::Gateway(GatewayError::ApiError {
            status_code: 503,
            message: "model loading".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("model loading"));
        assert_eq!(err.kind(), ErrorKind::GatewayUnavailable);
    }

    #[test]
    fn tool_not_found_text_matches_dispatch_contract() {
        let err = ToolError::NotFound("frobnicate".into());
        assert_eq!(err.to_string(), "Function frobnicate not found");
        assert_eq!(Error::Tool(err).kind(), ErrorKind::ToolNotFound);
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            Error::Tool(ToolError::failed("shell", "boom")).kind(),
            ErrorKind::ToolExecutionFailure
        );
        assert_eq!(
            Error::InvalidMessage("x".into()).kind(),
            ErrorKind::InvalidMessage
        );
        assert_eq!(
            Error::DuplicateTool("read_file".into()).kind(),
            ErrorKind::DuplicateTool
        );
        assert_eq!(
            Error::SchemaMismatch {
                tool: "read_file".into(),
                reason: "r".into()
            }
            .kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn missing_argument_message() {
        let err = ToolError::missing_argument("target_file");
        assert_eq!(err.to_string(), "missing required argument 'target_file'");
    }
}

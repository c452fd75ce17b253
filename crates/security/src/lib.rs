//! Security checks for OpenCursor's built-in tools.
//!
//! Provides:
//! - **Path validation**: resolve tool-supplied paths against the workspace,
//!   reject traversal and forbidden locations
//! - **Command allowlist**: restrict which programs `run_terminal_cmd` may start

pub mod command;
pub mod path;

pub use command::{CommandRejected, check_command};
pub use path::{PathValidationError, expand_tilde, resolve_path};

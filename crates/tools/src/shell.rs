//! `run_terminal_cmd`: run a shell command in the workspace root.
//!
//! Supports an optional program allowlist and background execution.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::args;
use crate::workspace::Workspace;

pub struct RunTerminalCmdTool {
    workspace: Arc<Workspace>,
    /// If non-empty, only these programs may be started.
    allowed_commands: Vec<String>,
}

impl RunTerminalCmdTool {
    pub fn new(workspace: Arc<Workspace>, allowed_commands: Vec<String>) -> Self {
        Self {
            workspace,
            allowed_commands,
        }
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.current_dir(self.workspace.root());
        cmd
    }
}

#[async_trait]
impl Tool for RunTerminalCmdTool {
    fn name(&self) -> &str {
        "run_terminal_cmd"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["command"]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "run_terminal_cmd",
            "Run a terminal command in the workspace root and return its output.",
        )
        .param(ParamSpec::required(
            "command",
            ParamType::String,
            "The command to run",
        ))
        .param(ParamSpec::optional(
            "is_background",
            ParamType::Boolean,
            "Start the command and return immediately without waiting for output",
        ))
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let command = args::required_str(&arguments, "command")?;
        let is_background = args::optional_bool(&arguments, "is_background", false)?;

        opencursor_security::check_command(command, &self.allowed_commands).map_err(|e| {
            ToolError::PermissionDenied {
                tool_name: self.name().into(),
                reason: e.to_string(),
            }
        })?;

        debug!(command = %command, background = is_background, "Executing shell command");

        if is_background {
            self.command(command)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| {
                    ToolError::failed(self.name(), format!("Error starting command: {e}"))
                })?;
            return Ok(format!("Running command in background: {command}").into());
        }

        let output = self
            .command(command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Error executing command: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        let mut result = format!("Command output:\n{stdout}");
        if !stderr.is_empty() {
            result.push_str(&format!("\n\nErrors:\n{stderr}"));
        }
        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            warn!(command = %command, exit_code = code, "Command failed");
            result.push_str(&format!("\n\nExit code: {code}"));
        }

        Ok(result.into())
    }
}

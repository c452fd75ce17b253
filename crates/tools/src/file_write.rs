//! `edit_file`: create a file or replace its contents.

use std::sync::Arc;

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};
use similar::TextDiff;
use tracing::debug;

use crate::{args, git};
use crate::workspace::Workspace;

pub struct EditFileTool {
    workspace: Arc<Workspace>,
}

impl EditFileTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["target_file", "code_edit"]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "edit_file",
            "Write the full new contents of a file. Creates the file (and missing parent \
             directories) if needed. Returns a diff of the change.",
        )
        .param(ParamSpec::required(
            "target_file",
            ParamType::String,
            "Path of the file to create or overwrite",
        ))
        .param(ParamSpec::required(
            "code_edit",
            ParamType::String,
            "The complete new file contents",
        ))
        .param(ParamSpec::optional(
            "instructions",
            ParamType::String,
            "One sentence describing the edit",
        ))
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let target = args::required_str(&arguments, "target_file")?;
        let code_edit = args::required_str(&arguments, "code_edit")?;
        let instructions = args::optional_str(&arguments, "instructions")?.unwrap_or("");

        let path = self.workspace.resolve(self.name(), target)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ToolError::failed(self.name(), format!("Error creating directory: {e}"))
            })?;
        }

        let previous = match tokio::fs::read_to_string(&path).await {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(ToolError::failed(self.name(), format!("Error editing file: {e}")));
            }
        };

        tokio::fs::write(&path, code_edit)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Error editing file: {e}")))?;

        debug!(path = %path.display(), bytes = code_edit.len(), "File written");

        let mut report = match &previous {
            Some(_) => format!("Updated file: {target}"),
            None => format!("Created file: {target}"),
        };
        if !instructions.is_empty() {
            report.push_str(&format!("\nInstructions applied: {instructions}"));
        }

        if previous.as_deref() == Some(code_edit) {
            report.push_str("\n\nNo changes (content identical)");
        } else if let Some(git_diff) = git::diff_file(self.workspace.root(), &path).await {
            report.push_str(&format!("\n\n[Git Diff]\n{git_diff}"));
        } else {
            let old = previous.as_deref().unwrap_or("");
            let diff = unified_diff(target, old, code_edit);
            report.push_str(&format!("\n\n[Changes Made]\n{diff}"));
        }

        Ok(report.into())
    }
}

fn unified_diff(target: &str, old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{target}"), &format!("b/{target}"))
        .to_string()
}

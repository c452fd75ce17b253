//! `delete_file`: remove a single file.

use std::sync::Arc;

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};

use crate::args;
use crate::workspace::Workspace;

pub struct DeleteFileTool {
    workspace: Arc<Workspace>,
}

impl DeleteFileTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["target_file"]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("delete_file", "Delete a file from the workspace.").param(
            ParamSpec::required("target_file", ParamType::String, "Path of the file to delete"),
        )
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let target = args::required_str(&arguments, "target_file")?;
        let path = self.workspace.resolve(self.name(), target)?;

        if !path.exists() {
            return Ok(format!("File not found: {target}").into());
        }
        if path.is_dir() {
            return Err(ToolError::failed(
                self.name(),
                format!("{target} is a directory, not a file"),
            ));
        }

        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Error deleting file: {e}")))?;
        Ok(format!("Deleted file: {target}").into())
    }
}

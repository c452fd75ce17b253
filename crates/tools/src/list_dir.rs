//! `list_dir`: one level of a directory.

use std::sync::Arc;

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};

use crate::args;
use crate::workspace::Workspace;

pub struct ListDirTool {
    workspace: Arc<Workspace>,
}

impl ListDirTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &[]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("list_dir", "List the contents of a directory.").param(
            ParamSpec::optional(
                "directory",
                ParamType::String,
                "Directory to list, relative to the workspace root (default \".\")",
            ),
        )
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let directory = args::optional_str(&arguments, "directory")?.unwrap_or(".");
        let path = self.workspace.resolve(self.name(), directory)?;

        let mut reader = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Error listing directory: {e}")))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Error listing directory: {e}")))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let meta = entry.metadata().await.ok();
            let line = match meta {
                Some(m) if m.is_dir() => format!("[dir] {name}"),
                Some(m) => format!("[file] {name} ({}B)", m.len()),
                None => format!("[file] {name}"),
            };
            entries.push((name, line));
        }

        if entries.is_empty() {
            return Ok(format!("Directory {directory} is empty").into());
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries
            .into_iter()
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("\n")
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn lists_sorted_with_kinds() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "12345").unwrap();
        std::fs::create_dir(dir.path().join("a_dir")).unwrap();

        let tool = ListDirTool::new(Arc::new(Workspace::new(dir.path())));
        let out = tool.call(ToolArguments::new()).await.unwrap().to_text();
        assert_eq!(out, "[dir] a_dir\n[file] b.txt (5B)");
    }

    #[tokio::test]
    async fn empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        let tool = ListDirTool::new(Arc::new(Workspace::new(dir.path())));
        let out = tool
            .call(json!({"directory": "empty"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        assert_eq!(out.to_text(), "Directory empty is empty");
    }

    #[tokio::test]
    async fn missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ListDirTool::new(Arc::new(Workspace::new(dir.path())));
        let err = tool
            .call(json!({"directory": "nope"}).as_object().cloned().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Error listing directory"));
    }
}

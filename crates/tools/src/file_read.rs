//! `read_file`: read a file, optionally a window of lines.

use std::sync::Arc;

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};

use crate::args;
use crate::workspace::Workspace;

pub struct ReadFileTool {
    workspace: Arc<Workspace>,
}

impl ReadFileTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["target_file"]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "read_file",
            "Read the contents of a file. Reads a window of lines when offset/limit are given.",
        )
        .param(ParamSpec::required(
            "target_file",
            ParamType::String,
            "Path of the file, relative to the workspace root or absolute",
        ))
        .param(ParamSpec::optional(
            "offset",
            ParamType::Integer,
            "Line to start reading from (0-indexed)",
        ))
        .param(ParamSpec::optional(
            "limit",
            ParamType::Integer,
            "Maximum number of lines to read",
        ))
        .param(ParamSpec::optional(
            "should_read_entire_file",
            ParamType::Boolean,
            "Ignore offset and limit and return the whole file",
        ))
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let target = args::required_str(&arguments, "target_file")?;
        let offset = args::optional_i64(&arguments, "offset")?.unwrap_or(0).max(0) as usize;
        let limit = args::optional_i64(&arguments, "limit")?.map(|l| l.max(0) as usize);
        let entire = args::optional_bool(&arguments, "should_read_entire_file", false)?;

        let path = self.workspace.resolve(self.name(), target)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Error reading file: {e}")))?;

        if entire {
            return Ok(content.into());
        }
        Ok(line_window(&content, offset, limit).into())
    }
}

/// Lines `[offset, offset + limit)` with markers for what was left out.
fn line_window(content: &str, offset: usize, limit: Option<usize>) -> String {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let total = lines.len();
    let start = offset.min(total);
    let end = match limit {
        Some(limit) => start.saturating_add(limit).min(total),
        None => total,
    };

    let mut parts = Vec::with_capacity(3);
    if start > 0 {
        parts.push(format!("[Lines 1-{start} omitted]"));
    }
    parts.push(lines[start..end].concat());
    if end < total {
        parts.push(format!("[Lines {}-{total} omitted]", end + 1));
    }
    parts.join("\n")
}

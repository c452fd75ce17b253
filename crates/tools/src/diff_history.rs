//! `diff_history`: what changed recently in the workspace.
//!
//! Prefers `git log --stat`; outside a repository it lists the most recently
//! modified files instead.

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use opencursor_core::error::ToolError;
use opencursor_core::tool::{Tool, ToolArguments, ToolOutput, ToolSchema};

use crate::git;
use crate::walk;
use crate::workspace::Workspace;

const RECENT_COMMITS: &str = "-5";
const RECENT_FILES: usize = 10;

pub struct DiffHistoryTool {
    workspace: Arc<Workspace>,
}

impl DiffHistoryTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

/// Newest first, as `(relative path, modified, size)`.
fn recently_modified(root: &Path, workspace: &Workspace) -> Vec<(String, SystemTime, u64)> {
    let mut files: Vec<_> = walk::workspace_files(root)
        .filter(|e| !walk::is_binary(e.path()))
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            Some((workspace.relative(e.path()), meta.modified().ok()?, meta.len()))
        })
        .collect();
    files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    files.truncate(RECENT_FILES);
    files
}

#[async_trait]
impl Tool for DiffHistoryTool {
    fn name(&self) -> &str {
        "diff_history"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &[]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "diff_history",
            "Show recent changes in the workspace: the last commits with their file stats, \
             or the most recently modified files when the workspace is not a git repository.",
        )
    }

    async fn call(&self, _arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let root = self.workspace.root();
        if let Some(log) = git::run(root, &["log", "--stat", RECENT_COMMITS, "--oneline"]).await
            && !log.trim().is_empty()
        {
            return Ok(format!("Recent git history:\n{}", log.trim_end()).into());
        }

        let workspace = Arc::clone(&self.workspace);
        let files = tokio::task::spawn_blocking(move || {
            recently_modified(workspace.root(), &workspace)
        })
        .await
        .map_err(|e| ToolError::failed(self.name(), format!("listing aborted: {e}")))?;

        if files.is_empty() {
            return Ok("No files in the workspace".into());
        }

        let mut out = String::from("Recent file modifications:");
        for (path, modified, size) in files {
            let when = DateTime::<Local>::from(modified).format("%Y-%m-%d %H:%M:%S");
            out.push_str(&format!("\n{when} - {path} ({size} bytes)"));
        }
        Ok(out.into())
    }
}

//! `file_search`: fuzzy file-name search.

use std::sync::Arc;

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};

use crate::args;
use crate::walk;
use crate::workspace::Workspace;

pub struct FileSearchTool {
    workspace: Arc<Workspace>,
    max_results: usize,
}

impl FileSearchTool {
    pub fn new(workspace: Arc<Workspace>, max_results: usize) -> Self {
        Self {
            workspace,
            max_results: max_results.max(1),
        }
    }
}

#[async_trait]
impl Tool for FileSearchTool {
    fn name(&self) -> &str {
        "file_search"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["query"]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "file_search",
            "Find files whose name contains the query (case-insensitive). \
             Exact name matches come first.",
        )
        .param(ParamSpec::required(
            "query",
            ParamType::String,
            "Part of the file name to look for",
        ))
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let query = args::required_str(&arguments, "query")?.to_string();
        let needle = query.to_lowercase();

        let workspace = Arc::clone(&self.workspace);
        let mut matches: Vec<(bool, String)> = tokio::task::spawn_blocking(move || {
            walk::workspace_files(workspace.root())
                .filter_map(|entry| {
                    let name = entry.file_name().to_string_lossy().to_lowercase();
                    name.contains(&needle)
                        .then(|| (name == needle, workspace.relative(entry.path())))
                })
                .collect()
        })
        .await
        .map_err(|e| ToolError::failed("file_search", format!("search aborted: {e}")))?;

        if matches.is_empty() {
            return Ok(format!("No files matching '{query}' found").into());
        }

        // Stable: exact basename matches first, walk order otherwise.
        matches.sort_by_key(|(exact, _)| !*exact);
        let listed: Vec<String> = matches
            .into_iter()
            .take(self.max_results)
            .map(|(_, path)| path)
            .collect();

        Ok(format!("Matching files:\n{}", listed.join("\n")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: serde_json::Value) -> ToolArguments {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn exact_match_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("a/main_test.rs"), "").unwrap();
        std::fs::write(dir.path().join("main.rs"), "").unwrap();

        let tool = FileSearchTool::new(Arc::new(Workspace::new(dir.path())), 10);
        let out = tool
            .call(args(json!({"query": "MAIN.rs"})))
            .await
            .unwrap()
            .to_text();
        assert_eq!(out, "Matching files:\nmain.rs");

        let out = tool
            .call(args(json!({"query": "main"})))
            .await
            .unwrap()
            .to_text();
        assert_eq!(out, "Matching files:\na/main_test.rs\nmain.rs");
    }

    #[tokio::test]
    async fn limited_results() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            std::fs::write(dir.path().join(format!("f{i}.txt")), "").unwrap();
        }
        let tool = FileSearchTool::new(Arc::new(Workspace::new(dir.path())), 3);
        let out = tool
            .call(args(json!({"query": ".txt"})))
            .await
            .unwrap()
            .to_text();
        assert_eq!(out.lines().count(), 4);
    }

    #[tokio::test]
    async fn no_match() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileSearchTool::new(Arc::new(Workspace::new(dir.path())), 10);
        let out = tool
            .call(args(json!({"query": "zzz"})))
            .await
            .unwrap()
            .to_text();
        assert_eq!(out, "No files matching 'zzz' found");
    }
}

//! Built-in tool implementations for OpenCursor.
//!
//! Tools give the agent its hands: read and edit files in the workspace,
//! search code and its recent history, run terminal commands, search and
//! fetch the web, and a pair of integer arithmetic helpers.
//!
//! File tools resolve every path through a shared [`Workspace`], which
//! applies the forbidden-path list and (optionally) confinement to the
//! workspace root.

pub mod args;
pub mod code_usages;
pub mod delete_file;
pub mod diff_history;
pub mod fetch_webpage;
pub mod file_read;
pub mod file_search;
pub mod file_write;
mod git;
pub mod grep_search;
mod html;
pub mod list_dir;
pub mod math;
pub mod search_replace;
pub mod shell;
mod walk;
pub mod web_search;
pub mod workspace;

use std::path::Path;
use std::sync::Arc;

use opencursor_config::ToolsConfig;
use opencursor_core::tool::{Tool, ToolRegistry};

pub use workspace::Workspace;

/// Create the registry of built-in tools rooted at `workspace`.
///
/// Registration order is the order the tools are advertised to the model.
pub fn default_registry(
    workspace: &Path,
    config: &ToolsConfig,
) -> opencursor_core::Result<ToolRegistry> {
    let ws = Arc::new(Workspace::from_config(workspace, config));

    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(file_read::ReadFileTool::new(Arc::clone(&ws))),
        Arc::new(file_write::EditFileTool::new(Arc::clone(&ws))),
        Arc::new(list_dir::ListDirTool::new(Arc::clone(&ws))),
        Arc::new(delete_file::DeleteFileTool::new(Arc::clone(&ws))),
        Arc::new(search_replace::SearchReplaceTool::new(Arc::clone(&ws))),
        Arc::new(shell::RunTerminalCmdTool::new(
            Arc::clone(&ws),
            config.allowed_commands.clone(),
        )),
        Arc::new(grep_search::GrepSearchTool::new(
            Arc::clone(&ws),
            config.max_grep_results,
        )),
        Arc::new(file_search::FileSearchTool::new(
            Arc::clone(&ws),
            config.max_file_search_results,
        )),
        Arc::new(code_usages::ListCodeUsagesTool::new(Arc::clone(&ws))),
        Arc::new(diff_history::DiffHistoryTool::new(Arc::clone(&ws))),
        Arc::new(web_search::WebSearchTool::new()),
        Arc::new(fetch_webpage::FetchWebpageTool::new(config.max_fetch_chars)),
        Arc::new(math::AddTwoNumbersTool),
        Arc::new(math::SubtractTwoNumbersTool),
    ];

    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register_tool(tool)?;
    }
    tracing::debug!(
        count = registry.len(),
        root = %ws.root().display(),
        "Built-in tools registered"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_registry_has_all_tools_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(dir.path(), &ToolsConfig::default()).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "read_file",
                "edit_file",
                "list_dir",
                "delete_file",
                "search_replace",
                "run_terminal_cmd",
                "grep_search",
                "file_search",
                "list_code_usages",
                "diff_history",
                "web_search",
                "fetch_webpage",
                "add_two_numbers",
                "subtract_two_numbers",
            ]
        );
    }

    #[test]
    fn every_schema_matches_its_tool() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(dir.path(), &ToolsConfig::default()).unwrap();
        for schema in registry.all_schemas() {
            let tool = registry.resolve(&schema.name).unwrap();
            assert_eq!(tool.name(), schema.name);
            let mut required = schema.required_names();
            let mut mandatory = tool.mandatory_parameters().to_vec();
            required.sort_unstable();
            mandatory.sort_unstable();
            assert_eq!(required, mandatory, "{}", schema.name);
        }
    }

    #[tokio::test]
    async fn registry_tools_share_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(dir.path(), &ToolsConfig::default()).unwrap();

        let edit = registry.resolve("edit_file").unwrap();
        edit.call(
            json!({"target_file": "notes.txt", "code_edit": "hello\n"})
                .as_object()
                .cloned()
                .unwrap(),
        )
        .await
        .unwrap();

        let read = registry.resolve("read_file").unwrap();
        let out = read
            .call(json!({"target_file": "notes.txt"}).as_object().cloned().unwrap())
            .await
            .unwrap()
            .to_text();
        assert!(out.contains("hello"));
    }
}

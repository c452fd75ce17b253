//! `grep_search`: regex search over file contents in the workspace.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};
use regex::{Regex, RegexBuilder};

use crate::args;
use crate::walk::{self, MAX_SEARCH_FILE_BYTES};
use crate::workspace::Workspace;

pub struct GrepSearchTool {
    workspace: Arc<Workspace>,
    max_results: usize,
}

impl GrepSearchTool {
    pub fn new(workspace: Arc<Workspace>, max_results: usize) -> Self {
        Self {
            workspace,
            max_results: max_results.max(1),
        }
    }
}

struct GrepQuery {
    matcher: Regex,
    include: Option<String>,
    exclude: Option<String>,
    max_results: usize,
}

/// Build the matcher; an invalid regex falls back to a literal search.
fn build_matcher(query: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(query)
        .case_insensitive(!case_sensitive)
        .build()
        .or_else(|_| {
            RegexBuilder::new(&regex::escape(query))
                .case_insensitive(!case_sensitive)
                .build()
        })
}

fn search(root: &Path, workspace: &Workspace, q: &GrepQuery) -> (Vec<String>, bool) {
    let mut results = Vec::new();

    for entry in walk::workspace_files(root) {
        let path = entry.path();
        if walk::is_binary(path) {
            continue;
        }
        if entry
            .metadata()
            .map(|m| m.len() > MAX_SEARCH_FILE_BYTES)
            .unwrap_or(true)
        {
            continue;
        }

        let relative = workspace.relative(path);
        if let Some(include) = &q.include
            && !walk::path_matches(include, &relative)
        {
            continue;
        }
        if let Some(exclude) = &q.exclude
            && walk::path_matches(exclude, &relative)
        {
            continue;
        }

        // Non-UTF-8 files are skipped.
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };

        for (i, line) in content.lines().enumerate() {
            if q.matcher.is_match(line) {
                if results.len() == q.max_results {
                    return (results, true);
                }
                results.push(format!("{relative}:{}: {}", i + 1, line.trim()));
            }
        }
    }

    (results, false)
}

#[async_trait]
impl Tool for GrepSearchTool {
    fn name(&self) -> &str {
        "grep_search"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["query"]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "grep_search",
            "Search file contents in the workspace for a regex pattern. \
             Returns matching lines as path:line: text.",
        )
        .param(ParamSpec::required(
            "query",
            ParamType::String,
            "Regex (or plain text) to search for",
        ))
        .param(ParamSpec::optional(
            "include_pattern",
            ParamType::String,
            "Glob of files to include, e.g. '*.rs'",
        ))
        .param(ParamSpec::optional(
            "exclude_pattern",
            ParamType::String,
            "Glob of files to exclude",
        ))
        .param(ParamSpec::optional(
            "case_sensitive",
            ParamType::Boolean,
            "Match case exactly (default false)",
        ))
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let query = args::required_str(&arguments, "query")?.to_string();
        let case_sensitive = args::optional_bool(&arguments, "case_sensitive", false)?;
        let matcher = build_matcher(&query, case_sensitive)
            .map_err(|e| ToolError::InvalidArguments(format!("invalid query: {e}")))?;

        let q = GrepQuery {
            matcher,
            include: args::optional_str(&arguments, "include_pattern")?.map(str::to_string),
            exclude: args::optional_str(&arguments, "exclude_pattern")?.map(str::to_string),
            max_results: self.max_results,
        };

        let workspace = Arc::clone(&self.workspace);
        let (results, truncated) =
            tokio::task::spawn_blocking(move || search(workspace.root(), &workspace, &q))
                .await
                .map_err(|e| ToolError::failed("grep_search", format!("search aborted: {e}")))?;

        if results.is_empty() {
            return Ok(format!("No matches found for '{query}'").into());
        }

        let mut out = results.join("\n");
        if truncated {
            out.push_str(&format!(
                "\n... (showing first {} matches)",
                self.max_results
            ));
        }
        Ok(out.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: serde_json::Value) -> ToolArguments {
        v.as_object().cloned().unwrap()
    }

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        std::fs::write(
            dir.path().join("src/lib.rs"),
            "pub fn add(a: i32) {}\nfn helper() {}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("src/main.py"), "def add(a):\n    pass\n").unwrap();
        std::fs::write(dir.path().join("node_modules/pkg/index.js"), "add()").unwrap();
        dir
    }

    #[tokio::test]
    async fn finds_matches_with_line_numbers() {
        let dir = setup();
        let tool = GrepSearchTool::new(Arc::new(Workspace::new(dir.path())), 50);
        let out = tool
            .call(args(json!({"query": "fn \\w+"})))
            .await
            .unwrap()
            .to_text();
        assert_eq!(out, "src/lib.rs:1: pub fn add(a: i32) {}\nsrc/lib.rs:2: fn helper() {}");
    }

    #[tokio::test]
    async fn include_pattern_and_skipped_dirs() {
        let dir = setup();
        let tool = GrepSearchTool::new(Arc::new(Workspace::new(dir.path())), 50);
        let out = tool
            .call(args(json!({"query": "ADD", "include_pattern": "*.py"})))
            .await
            .unwrap()
            .to_text();
        assert_eq!(out, "src/main.py:1: def add(a):");
    }

    #[tokio::test]
    async fn case_sensitive_search() {
        let dir = setup();
        let tool = GrepSearchTool::new(Arc::new(Workspace::new(dir.path())), 50);
        let out = tool
            .call(args(json!({"query": "ADD", "case_sensitive": true})))
            .await
            .unwrap()
            .to_text();
        assert_eq!(out, "No matches found for 'ADD'");
    }

    #[tokio::test]
    async fn invalid_regex_falls_back_to_literal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "call foo(\n").unwrap();
        let tool = GrepSearchTool::new(Arc::new(Workspace::new(dir.path())), 50);
        let out = tool
            .call(args(json!({"query": "foo("})))
            .await
            .unwrap()
            .to_text();
        assert_eq!(out, "a.txt:1: call foo(");
    }

    #[tokio::test]
    async fn results_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x\nx\nx\n").unwrap();
        let tool = GrepSearchTool::new(Arc::new(Workspace::new(dir.path())), 2);
        let out = tool
            .call(args(json!({"query": "x"})))
            .await
            .unwrap()
            .to_text();
        assert_eq!(out, "a.txt:1: x\na.txt:2: x\n... (showing first 2 matches)");
    }
}

//! `list_code_usages`: whole-word symbol search with surrounding context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};
use regex::Regex;

use crate::args;
use crate::walk::{self, MAX_SEARCH_FILE_BYTES};
use crate::workspace::Workspace;

/// Lines of context shown on each side of a usage.
const CONTEXT_LINES: usize = 2;

const MAX_USAGES: usize = 10;

/// Source extensions searched when no explicit files are given.
const CODE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "ts", "tsx", "go", "java", "kt", "c", "h", "cc", "cpp", "hpp", "cs",
    "rb", "php", "swift", "scala", "sh",
];

pub struct ListCodeUsagesTool {
    workspace: Arc<Workspace>,
}

impl ListCodeUsagesTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

fn code_files(root: &Path) -> Vec<PathBuf> {
    walk::workspace_files(root)
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| CODE_EXTENSIONS.contains(&x))
        })
        .filter(|e| e.metadata().is_ok_and(|m| m.len() <= MAX_SEARCH_FILE_BYTES))
        .map(|e| e.into_path())
        .collect()
}

/// Each usage of `symbol` in `content`, rendered with its context window.
fn usages_in(content: &str, symbol: &Regex, relative: &str, out: &mut Vec<String>) {
    let lines: Vec<&str> = content.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if out.len() == MAX_USAGES {
            return;
        }
        if !symbol.is_match(line) {
            continue;
        }
        let start = i.saturating_sub(CONTEXT_LINES);
        let end = (i + CONTEXT_LINES + 1).min(lines.len());
        out.push(format!(
            "File: {relative}, Line {}\n```\n{}\n```\n",
            i + 1,
            lines[start..end].join("\n")
        ));
    }
}

#[async_trait]
impl Tool for ListCodeUsagesTool {
    fn name(&self) -> &str {
        "list_code_usages"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["symbol_name"]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "list_code_usages",
            "Find usages of a symbol (function, type, variable) as a whole word, \
             with two lines of context around each.",
        )
        .param(ParamSpec::required(
            "symbol_name",
            ParamType::String,
            "Name of the symbol to find",
        ))
        .param(ParamSpec::optional(
            "file_paths",
            ParamType::Array,
            "Only search these files",
        ))
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let symbol_name = args::required_str(&arguments, "symbol_name")?.trim().to_string();
        if symbol_name.is_empty() {
            return Err(ToolError::InvalidArguments(
                "argument 'symbol_name' must not be empty".into(),
            ));
        }
        let symbol = Regex::new(&format!(r"\b{}\b", regex::escape(&symbol_name)))
            .map_err(|e| ToolError::failed(self.name(), e))?;

        let files = match args::optional_string_list(&arguments, "file_paths")? {
            Some(paths) => paths
                .iter()
                .map(|p| self.workspace.resolve(self.name(), p))
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                let root = self.workspace.root().to_path_buf();
                tokio::task::spawn_blocking(move || code_files(&root))
                    .await
                    .map_err(|e| ToolError::failed(self.name(), format!("search aborted: {e}")))?
            }
        };

        let mut usages = Vec::new();
        for path in files {
            // Unreadable and non-UTF-8 files are skipped.
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };
            usages_in(&content, &symbol, &self.workspace.relative(&path), &mut usages);
            if usages.len() == MAX_USAGES {
                break;
            }
        }

        if usages.is_empty() {
            return Ok(format!("No usages found for '{symbol_name}'").into());
        }
        Ok(usages.join("\n").into())
    }
}

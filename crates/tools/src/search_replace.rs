//! `search_replace`: replace one unique occurrence of text in a file.

use std::sync::Arc;

use async_trait::async_trait;
use opencursor_core::error::ToolError;
use opencursor_core::tool::{ParamSpec, ParamType, Tool, ToolArguments, ToolOutput, ToolSchema};

use crate::args;
use crate::workspace::Workspace;

pub struct SearchReplaceTool {
    workspace: Arc<Workspace>,
}

impl SearchReplaceTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for SearchReplaceTool {
    fn name(&self) -> &str {
        "search_replace"
    }

    fn mandatory_parameters(&self) -> &[&'static str] {
        &["file_path", "old_string", "new_string"]
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "search_replace",
            "Replace exactly one occurrence of old_string with new_string in a file. \
             Include enough surrounding context to make old_string unique.",
        )
        .param(ParamSpec::required(
            "file_path",
            ParamType::String,
            "Path of the file to modify",
        ))
        .param(ParamSpec::required(
            "old_string",
            ParamType::String,
            "Text to replace; must occur exactly once",
        ))
        .param(ParamSpec::required(
            "new_string",
            ParamType::String,
            "Replacement text",
        ))
    }

    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let file_path = args::required_str(&arguments, "file_path")?;
        let old_string = args::required_str(&arguments, "old_string")?;
        let new_string = args::required_str(&arguments, "new_string")?;

        if old_string.is_empty() {
            return Err(ToolError::InvalidArguments(
                "old_string must not be empty".into(),
            ));
        }

        let path = self.workspace.resolve(self.name(), file_path)?;
        if !path.is_file() {
            return Err(ToolError::failed(
                self.name(),
                format!("File {file_path} not found"),
            ));
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Error reading file: {e}")))?;

        match content.matches(old_string).count() {
            0 => Err(ToolError::failed(
                self.name(),
                format!("Could not find the specified text in {file_path}"),
            )),
            1 => {
                let updated = content.replacen(old_string, new_string, 1);
                tokio::fs::write(&path, &updated).await.map_err(|e| {
                    ToolError::failed(self.name(), format!("Error writing file: {e}"))
                })?;

                let line = content
                    .find(old_string)
                    .map(|i| content[..i].matches('\n').count() + 1)
                    .unwrap_or(1);
                Ok(format!("Successfully replaced text in {file_path} (at line {line})").into())
            }
            n => Err(ToolError::failed(
                self.name(),
                format!(
                    "Found {n} occurrences of the text. \
                     Please provide more context to make the match unique."
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: serde_json::Value) -> ToolArguments {
        v.as_object().cloned().unwrap()
    }

    fn setup(content: &str) -> (tempfile::TempDir, SearchReplaceTool) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.rs"), content).unwrap();
        let tool = SearchReplaceTool::new(Arc::new(Workspace::new(dir.path())));
        (dir, tool)
    }

    #[tokio::test]
    async fn replaces_unique_occurrence() {
        let (dir, tool) = setup("fn a() {}\nfn b() {}\n");
        let out = tool
            .call(args(json!({
                "file_path": "lib.rs",
                "old_string": "fn b() {}",
                "new_string": "fn c() {}"
            })))
            .await
            .unwrap()
            .to_text();

        assert!(out.starts_with("Successfully replaced text in lib.rs"));
        assert!(out.contains("line 2"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("lib.rs")).unwrap(),
            "fn a() {}\nfn c() {}\n"
        );
    }

    #[tokio::test]
    async fn ambiguous_match_rejected() {
        let (dir, tool) = setup("x\nx\n");
        let err = tool
            .call(args(json!({"file_path": "lib.rs", "old_string": "x", "new_string": "y"})))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Found 2 occurrences"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("lib.rs")).unwrap(),
            "x\nx\n"
        );
    }

    #[tokio::test]
    async fn no_match_rejected() {
        let (_dir, tool) = setup("abc");
        let err = tool
            .call(args(json!({"file_path": "lib.rs", "old_string": "zzz", "new_string": "y"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Could not find"));
    }

    #[tokio::test]
    async fn missing_file() {
        let (_dir, tool) = setup("");
        let err = tool
            .call(args(json!({"file_path": "other.rs", "old_string": "a", "new_string": "b"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "File other.rs not found");
    }
}

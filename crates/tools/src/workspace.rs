//! The directory tools operate in, and the path policy that guards it.

use std::path::{Path, PathBuf};

use opencursor_config::ToolsConfig;
use opencursor_core::error::ToolError;

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    forbidden_paths: Vec<String>,
    restrict_to_workspace: bool,
}

impl Workspace {
    /// A workspace with no forbidden paths and no confinement.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            root: root.canonicalize().unwrap_or(root),
            forbidden_paths: Vec::new(),
            restrict_to_workspace: false,
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &ToolsConfig) -> Self {
        Self {
            forbidden_paths: config.forbidden_paths.clone(),
            restrict_to_workspace: config.restrict_to_workspace,
            ..Self::new(root)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path argument for `tool_name`.
    pub fn resolve(&self, tool_name: &str, raw: &str) -> Result<PathBuf, ToolError> {
        opencursor_security::resolve_path(
            &self.root,
            raw,
            &self.forbidden_paths,
            self.restrict_to_workspace,
        )
        .map_err(|e| ToolError::PermissionDenied {
            tool_name: tool_name.to_string(),
            reason: e.to_string(),
        })
    }

    /// `path` relative to the root when it lies inside, else as given.
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

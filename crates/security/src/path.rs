//! Path validation for file tools.
//!
//! Tool arguments name files relative to the workspace root, or absolutely.
//! Every path is resolved here before a tool touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Error returned when path validation fails.
#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("Path must not be empty")]
    Empty,

    #[error("Path '{path}' is outside the workspace")]
    OutsideWorkspace { path: String },

    #[error("Path '{path}' matches forbidden pattern '{pattern}'")]
    ForbiddenPath { path: String, pattern: String },

    #[error("Path traversal detected in '{path}'")]
    PathTraversal { path: String },

    #[error("Failed to canonicalize path '{path}': {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

/// Resolve a tool-supplied path against `workspace_root`.
///
/// Checks, in order:
/// 1. No `..` components
/// 2. Relative paths are joined onto the workspace root; `~` is expanded
/// 3. The result is canonicalized (or its parent, for files not yet created)
/// 4. The path is not under any forbidden prefix
/// 5. With `restrict_to_workspace`, the path is inside the workspace root
///
/// Returns the resolved path on success.
pub fn resolve_path(
    workspace_root: &Path,
    path: &str,
    forbidden_paths: &[String],
    restrict_to_workspace: bool,
) -> Result<PathBuf, PathValidationError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(PathValidationError::Empty);
    }

    let expanded = PathBuf::from(expand_tilde(trimmed));
    if expanded.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(PathValidationError::PathTraversal { path: path.into() });
    }

    let joined = if expanded.is_absolute() {
        expanded
    } else {
        workspace_root.join(expanded)
    };
    let resolved = canonicalize_lenient(&joined, path)?;

    for forbidden in forbidden_paths {
        let prefix = canonical_or_raw(Path::new(&expand_tilde(forbidden)));
        if resolved.starts_with(&prefix) {
            tracing::warn!(
                path = %resolved.display(),
                pattern = %forbidden,
                "Blocked forbidden path"
            );
            return Err(PathValidationError::ForbiddenPath {
                path: path.into(),
                pattern: forbidden.clone(),
            });
        }
    }

    if restrict_to_workspace && !resolved.starts_with(canonical_or_raw(workspace_root)) {
        return Err(PathValidationError::OutsideWorkspace { path: path.into() });
    }

    Ok(resolved)
}

/// Canonicalize `path`, or its parent when the file does not exist yet.
/// Falls back to the raw path when neither exists (e.g. nested new dirs).
fn canonicalize_lenient(path: &Path, original: &str) -> Result<PathBuf, PathValidationError> {
    if path.exists() {
        return path
            .canonicalize()
            .map_err(|e| PathValidationError::CanonicalizeFailed {
                path: original.into(),
                reason: e.to_string(),
            });
    }

    if let Some(parent) = path.parent()
        && parent.exists()
    {
        let canonical_parent =
            parent
                .canonicalize()
                .map_err(|e| PathValidationError::CanonicalizeFailed {
                    path: original.into(),
                    reason: format!("Parent dir: {e}"),
                })?;
        return Ok(canonical_parent.join(path.file_name().unwrap_or_default()));
    }

    Ok(path.to_path_buf())
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = home_dir()
    {
        return path.replacen('~', &home, 1);
    }
    path.to_string()
}

fn home_dir() -> Option<String> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok()
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_joins_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();

        let resolved = resolve_path(dir.path(), "a.txt", &[], false).unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap().join("a.txt"));
    }

    #[test]
    fn new_file_resolves_through_parent() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_path(dir.path(), "new.rs", &[], true).unwrap();
        assert!(resolved.ends_with("new.rs"));
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn nested_new_dirs_fall_back_to_raw() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_path(dir.path(), "src/deep/mod.rs", &[], false).unwrap();
        assert!(resolved.ends_with("src/deep/mod.rs"));
    }

    #[test]
    fn path_traversal_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_path(dir.path(), "../../../etc/passwd", &[], false);
        match result.unwrap_err() {
            PathValidationError::PathTraversal { .. } => {}
            other => panic!("Expected PathTraversal, got: {other}"),
        }
    }

    #[test]
    fn empty_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_path(dir.path(), "  ", &[], false),
            Err(PathValidationError::Empty)
        ));
    }

    #[test]
    fn forbidden_path_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let secret = dir.path().join("secrets");
        std::fs::create_dir(&secret).unwrap();

        let forbidden = vec![secret.to_string_lossy().to_string()];
        let result = resolve_path(dir.path(), "secrets/key.pem", &forbidden, false);
        match result.unwrap_err() {
            PathValidationError::ForbiddenPath { pattern, .. } => {
                assert_eq!(pattern, forbidden[0]);
            }
            other => panic!("Expected ForbiddenPath, got: {other}"),
        }
    }

    #[test]
    fn forbidden_prefix_is_component_wise() {
        let dir = tempfile::tempdir().unwrap();
        let forbidden = vec![dir.path().join("sec").to_string_lossy().to_string()];
        assert!(resolve_path(dir.path(), "second.txt", &forbidden, false).is_ok());
    }

    #[test]
    fn absolute_outside_allowed_when_unrestricted() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let target = other.path().join("x.txt");
        let result = resolve_path(dir.path(), &target.to_string_lossy(), &[], false);
        assert!(result.is_ok());
    }

    #[test]
    fn absolute_outside_rejected_when_restricted() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let target = other.path().join("x.txt");
        let result = resolve_path(dir.path(), &target.to_string_lossy(), &[], true);
        assert!(matches!(
            result,
            Err(PathValidationError::OutsideWorkspace { .. })
        ));
    }

    #[test]
    fn tilde_expansion() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/.ssh"), format!("{home}/.ssh"));
        }
        assert_eq!(expand_tilde("/etc/shadow"), "/etc/shadow");
        assert_eq!(expand_tilde("a~b"), "a~b");
    }
}

//! Read-only `git` queries used to report changes back to the model.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

/// Run `git <args>` in `root`. `None` when git is missing, the directory is
/// not a repository, or the command fails.
pub async fn run(root: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .stdin(Stdio::null())
        .output()
        .await
        .inspect_err(|e| debug!(error = %e, "git unavailable"))
        .ok()?;

    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `git diff` of a tracked file, or `None` if it is untracked or unchanged.
pub async fn diff_file(root: &Path, file: &Path) -> Option<String> {
    let file = file.to_str()?;
    run(root, &["ls-files", "--error-unmatch", file]).await?;
    let diff = run(root, &["diff", "--", file]).await?;
    (!diff.trim().is_empty()).then_some(diff)
}

//! Workspace traversal shared by the search tools.

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "dist", "__pycache__"];

/// Extensions treated as binary.
const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "bin", "obj", "o", "a", "dll", "so", "dylib", "pyc", "pyo", "class", "png", "jpg",
    "jpeg", "gif", "ico", "pdf", "zip", "gz", "tar", "wasm",
];

/// Files larger than this are not searched.
pub const MAX_SEARCH_FILE_BYTES: u64 = 1024 * 1024;

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// Every regular file under `root`, hidden and build directories pruned,
/// in a stable (file-name sorted) order.
pub fn workspace_files(root: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
}

pub fn is_binary(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Simple glob matching supporting `*` (any run) and `?` (one char).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let (mut star, mut mark) = (None, 0);

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// Match `pattern` against a relative path. Patterns without a `/` are
/// also tried against the file name alone, so `*.rs` matches `src/lib.rs`.
pub fn path_matches(pattern: &str, relative: &str) -> bool {
    if glob_match(pattern, relative) {
        return true;
    }
    if !pattern.contains('/') {
        let name = relative.rsplit('/').next().unwrap_or(relative);
        return glob_match(pattern, name);
    }
    false
}

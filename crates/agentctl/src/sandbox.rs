//! Path containment for repository tools.
//!
//! Every path the model hands us is relative to the repository root. The sandbox resolves it
//! lexically, re-derives the path relative to the root, and refuses anything that climbs out.
//! Paths that exist are also canonicalized so a symlink cannot lead outside the root.
//! It also carries a small, fixed ignore list that stands in for `.gitignore` handling.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::errors::{ToolError, ToolResult};

/// Largest file the tools will read or search (1 MiB)
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;
/// Number of leading bytes inspected for a null byte
pub const BINARY_CHECK_SIZE: usize = 512;
/// Deepest recursion allowed when listing directories
pub const MAX_DIRECTORY_DEPTH: usize = 10;

const IGNORED_PATTERNS: &[&str] = &[
    ".git/",
    "node_modules/",
    ".claude/scratch/",
    "vendor/",
    "__pycache__/",
    ".pytest_cache/",
    ".mypy_cache/",
    "*.pyc",
    "*.pyo",
    ".DS_Store",
];

#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize(&root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a caller supplied path to an absolute path inside the root.
    ///
    /// `"."` and `""` resolve to the root itself.
    pub fn resolve(&self, path: &str) -> ToolResult<PathBuf> {
        let cleaned = normalize(Path::new(path));
        if cleaned.as_os_str().is_empty() {
            return Ok(self.root.clone());
        }

        let resolved = normalize(&self.root.join(&cleaned));
        let relative = relative_path(&self.root, &resolved);
        match relative.components().next() {
            Some(Component::ParentDir | Component::RootDir | Component::Prefix(_)) => {
                Err(ToolError::PathTraversal(path.to_string()))
            }
            _ => self.check_real_path(path, resolved),
        }
    }

    fn check_real_path(&self, path: &str, resolved: PathBuf) -> ToolResult<PathBuf> {
        // Missing paths are reported by the handlers
        let Ok(real) = fs::canonicalize(&resolved) else {
            return Ok(resolved);
        };
        let real_root = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        if real.starts_with(&real_root) {
            Ok(resolved)
        } else {
            Err(ToolError::PathTraversal(path.to_string()))
        }
    }

    /// Path of `path` relative to the root, as shown to the model
    pub fn relative(&self, path: &Path) -> PathBuf {
        let relative = relative_path(&self.root, &normalize(path));
        if relative.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            relative
        }
    }

    /// Whether any segment of the path matches the ignore list.
    ///
    /// This is a segment-by-segment comparison against fixed patterns, not a parser of
    /// ignore-file syntax.
    pub fn is_ignored(&self, path: &Path) -> bool {
        relative_path(&self.root, &normalize(path))
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => segment.to_str(),
                _ => None,
            })
            .any(|segment| {
                IGNORED_PATTERNS
                    .iter()
                    .any(|pattern| segment_matches(segment, pattern))
            })
    }
}

fn segment_matches(segment: &str, pattern: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix('*') {
        segment.ends_with(suffix)
    } else if let Some(dir) = pattern.strip_suffix('/') {
        segment == dir
    } else {
        segment == pattern
    }
}

/// A file is treated as binary when its first [`BINARY_CHECK_SIZE`] bytes contain a null byte
pub fn is_binary(content: &[u8]) -> bool {
    content.iter().take(BINARY_CHECK_SIZE).any(|&byte| byte == 0)
}

/// Lexically clean a path: drop `.` components and fold `..` into its parent.
///
/// A `..` directly under the filesystem root is dropped; a leading `..` on a relative
/// path is kept so the escape stays visible.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// The equivalent of `base/<result> == target`, climbing with `..` when target is outside base
fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = target.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push(Component::ParentDir.as_os_str());
    }
    for component in &target[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

//! Read-only repository exploration tools.
//!
//! Every handler resolves its paths through the [`Sandbox`] first, never mutates the
//! filesystem and never retries: the first filesystem error is returned with context.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;

use super::{optional_bool, optional_str, required_str, schemas, ToolRegistry};
use crate::errors::{ToolError, ToolResult};
use crate::git::{GitCli, GitError, GitQuery};
use crate::sandbox::{is_binary, Sandbox, MAX_DIRECTORY_DEPTH, MAX_FILE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DirectoryEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Listing {
    Directory {
        path: String,
        items: Vec<DirectoryEntry>,
    },
    /// Listing a file is answered, not refused, so the model can correct itself
    NotADirectory {
        path: String,
        #[serde(rename = "type")]
        kind: EntryKind,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineMatch {
    pub line_number: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMatches {
    pub path: String,
    pub match_count: usize,
    pub matching_lines: Vec<LineMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub pattern: String,
    pub path: String,
    pub matches: Vec<FileMatches>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
    pub permissions: String,
    pub modified: String,
    pub is_readonly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedFile {
    pub path: String,
    pub size: u64,
    pub modified: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedFiles {
    pub path: String,
    pub files: Vec<TrackedFile>,
    pub total: usize,
}

/// Which tools [`register_repo_tools`] installs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoToolOptions {
    /// Also register `search_files`, `get_file_info` and `list_git_files`
    pub advanced: bool,
}

pub struct RepoTools {
    sandbox: Sandbox,
    git: Arc<dyn GitQuery>,
}

impl RepoTools {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_git(root, Arc::new(GitCli))
    }

    pub fn with_git(root: impl Into<PathBuf>, git: Arc<dyn GitQuery>) -> Self {
        Self {
            sandbox: Sandbox::new(root),
            git,
        }
    }

    /// Tools rooted at the top level of the git working tree containing `start`
    pub fn discover(start: &Path) -> Result<Self, GitError> {
        Ok(Self::new(GitCli::repo_root(start)?))
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Registry holding these tools, see [`register_repo_tools`]
    pub fn into_registry(self, options: RepoToolOptions) -> ToolResult<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        register_repo_tools(&mut registry, Arc::new(self), options)?;
        Ok(registry)
    }

    pub fn list_directory(&self, path: &str, recursive: bool) -> ToolResult<Listing> {
        let abs_path = self.sandbox.resolve(path)?;
        let metadata = fs::metadata(&abs_path).map_err(ToolError::not_found(path))?;

        if !metadata.is_dir() {
            return Ok(Listing::NotADirectory {
                path: path.to_string(),
                kind: EntryKind::File,
                error: "path is a file, not a directory".to_string(),
            });
        }

        Ok(Listing::Directory {
            path: path.to_string(),
            items: self.directory_entries(&abs_path, recursive, 0)?,
        })
    }

    fn directory_entries(
        &self,
        dir: &Path,
        recursive: bool,
        depth: usize,
    ) -> ToolResult<Vec<DirectoryEntry>> {
        if depth >= MAX_DIRECTORY_DEPTH {
            return Err(ToolError::DepthLimitExceeded(MAX_DIRECTORY_DEPTH));
        }

        let mut entries = fs::read_dir(dir)
            .and_then(|entries| entries.collect::<Result<Vec<_>, _>>())
            .map_err(ToolError::io("failed to read directory"))?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry_path = entry.path();
            if self.sandbox.is_ignored(&entry_path) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry
                .file_type()
                .map_err(ToolError::io("failed to read directory"))?;

            if file_type.is_dir() {
                let children = if recursive {
                    Some(self.directory_entries(&entry_path, true, depth + 1)?)
                } else {
                    None
                };
                items.push(DirectoryEntry {
                    name,
                    kind: EntryKind::Directory,
                    size: None,
                    children,
                });
            } else {
                items.push(DirectoryEntry {
                    name,
                    kind: EntryKind::File,
                    size: entry.metadata().ok().map(|m| m.len()),
                    children: None,
                });
            }
        }

        Ok(items)
    }

    pub fn read_file(&self, path: &str) -> ToolResult<FileContent> {
        let abs_path = self.sandbox.resolve(path)?;
        let metadata = fs::metadata(&abs_path).map_err(ToolError::not_found(path))?;

        if metadata.is_dir() {
            return Err(ToolError::IsDirectory);
        }
        if metadata.len() > MAX_FILE_SIZE {
            return Err(ToolError::FileTooLarge {
                size: metadata.len(),
                max: MAX_FILE_SIZE,
            });
        }
        if self.sandbox.is_ignored(&abs_path) {
            return Err(ToolError::Ignored);
        }

        let bytes = fs::read(&abs_path).map_err(ToolError::io("failed to read file"))?;
        if is_binary(&bytes) {
            return Err(ToolError::BinaryFile);
        }

        Ok(FileContent {
            path: path.to_string(),
            size: bytes.len(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Grep-like search. Case-insensitive unless `case_sensitive` is set.
    pub fn search_files(
        &self,
        pattern: &str,
        path: &str,
        case_sensitive: bool,
    ) -> ToolResult<SearchResults> {
        let abs_path = self.sandbox.resolve(path)?;
        let metadata = fs::metadata(&abs_path).map_err(ToolError::not_found(path))?;

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()?;

        let candidates = if metadata.is_dir() {
            self.searchable_files(&abs_path)?
        } else if self.sandbox.is_ignored(&abs_path) {
            Vec::new()
        } else {
            vec![abs_path]
        };

        let matches: Vec<FileMatches> = candidates
            .iter()
            .filter_map(|file| self.search_file(&regex, file))
            .collect();

        Ok(SearchResults {
            pattern: pattern.to_string(),
            path: path.to_string(),
            total: matches.len(),
            matches,
        })
    }

    fn searchable_files(&self, dir: &Path) -> ToolResult<Vec<PathBuf>> {
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.sandbox.is_ignored(entry.path()));

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|err| ToolError::Io {
                context: "failed to walk directory",
                source: err.into(),
            })?;
            // Symlinks are not followed
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Unreadable, empty, oversized and binary files are skipped rather than reported
    fn search_file(&self, regex: &Regex, file: &Path) -> Option<FileMatches> {
        let metadata = fs::metadata(file).ok()?;
        if metadata.len() == 0 || metadata.len() > MAX_FILE_SIZE {
            return None;
        }

        let bytes = fs::read(file).ok()?;
        if is_binary(&bytes) {
            return None;
        }

        let content = String::from_utf8_lossy(&bytes);
        let matching_lines: Vec<LineMatch> = content
            .split('\n')
            .enumerate()
            .filter(|(_, line)| regex.is_match(line))
            .map(|(index, line)| LineMatch {
                line_number: index + 1,
                content: line.to_string(),
            })
            .collect();

        if matching_lines.is_empty() {
            return None;
        }

        Some(FileMatches {
            path: self.sandbox.relative(file).to_string_lossy().into_owned(),
            match_count: matching_lines.len(),
            matching_lines,
        })
    }

    pub fn get_file_info(&self, path: &str) -> ToolResult<FileInfo> {
        let abs_path = self.sandbox.resolve(path)?;
        let metadata = fs::metadata(&abs_path).map_err(ToolError::not_found(path))?;

        if metadata.is_dir() {
            return Err(ToolError::IsDirectory);
        }

        let mode = permission_bits(&metadata);
        Ok(FileInfo {
            path: path.to_string(),
            size: metadata.len(),
            permissions: format!("{:04o}", mode),
            modified: modified_rfc3339(&metadata),
            is_readonly: mode & 0o200 == 0,
        })
    }

    /// Files tracked by git under `path`. An untracked single file yields an empty list.
    pub fn list_git_files(&self, path: &str) -> ToolResult<TrackedFiles> {
        let abs_path = self.sandbox.resolve(path)?;
        let metadata = fs::metadata(&abs_path).map_err(ToolError::not_found(path))?;

        let root = self.sandbox.root();
        let relative = self.sandbox.relative(&abs_path);
        let relative = relative.to_string_lossy();

        let tracked = if metadata.is_dir() {
            let pathspec: &str = if relative == "." { "" } else { &relative };
            self.git.list_tracked_files(root, pathspec)?
        } else {
            self.git
                .tracked_file(root, &relative)?
                .into_iter()
                .collect()
        };

        // Tracked but deleted from the working tree
        let files: Vec<TrackedFile> = tracked
            .into_iter()
            .filter_map(|file| {
                let metadata = fs::metadata(root.join(&file)).ok()?;
                Some(TrackedFile {
                    size: metadata.len(),
                    modified: modified_rfc3339(&metadata),
                    path: file,
                })
            })
            .collect();

        Ok(TrackedFiles {
            path: path.to_string(),
            total: files.len(),
            files,
        })
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

fn modified_rfc3339(metadata: &fs::Metadata) -> String {
    metadata
        .modified()
        .map(|time| DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

fn to_value<T: Serialize>(result: T) -> ToolResult<Value> {
    Ok(serde_json::to_value(result)?)
}

/// Register the repository exploration tools backed by `tools`.
///
/// `list_directory` and `read_file` are always installed; the rest only with
/// [`RepoToolOptions::advanced`].
pub fn register_repo_tools(
    registry: &mut ToolRegistry,
    tools: Arc<RepoTools>,
    options: RepoToolOptions,
) -> ToolResult<()> {
    let repo = Arc::clone(&tools);
    registry.register(
        "list_directory",
        "List files and directories in a given path with type indicators (file/directory)",
        schemas::list_directory(),
        move |input| {
            let path = required_str(input, "path")?;
            let recursive = optional_bool(input, "recursive")?.unwrap_or(false);
            to_value(repo.list_directory(path, recursive)?)
        },
    )?;

    let repo = Arc::clone(&tools);
    registry.register(
        "read_file",
        "Read file contents from the repository. Returns error for binary files or files exceeding size limit",
        schemas::read_file(),
        move |input| to_value(repo.read_file(required_str(input, "path")?)?),
    )?;

    if !options.advanced {
        return Ok(());
    }

    let repo = Arc::clone(&tools);
    registry.register(
        "search_files",
        "Search for text patterns in files (grep-like functionality). Returns file paths and matching lines",
        schemas::search_files(),
        move |input| {
            let pattern = required_str(input, "pattern")?;
            let path = optional_str(input, "path")?.unwrap_or(".");
            let case_sensitive = optional_bool(input, "case_sensitive")?.unwrap_or(false);
            to_value(repo.search_files(pattern, path, case_sensitive)?)
        },
    )?;

    let repo = Arc::clone(&tools);
    registry.register(
        "get_file_info",
        "Get file metadata: size, permissions, last modified time",
        schemas::get_file_info(),
        move |input| to_value(repo.get_file_info(required_str(input, "path")?)?),
    )?;

    registry.register(
        "list_git_files",
        "List only files tracked by git (ignores untracked and ignored files)",
        schemas::list_git_files(),
        move |input| {
            let path = optional_str(input, "path")?.unwrap_or(".");
            to_value(tools.list_git_files(path)?)
        },
    )?;

    Ok(())
}

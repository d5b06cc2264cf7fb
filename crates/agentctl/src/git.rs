use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] io::Error),

    #[error("git command failed ({status}): {stderr}")]
    Command { status: String, stderr: String },
}

/// Version-control queries the repository tools depend on
pub trait GitQuery: Send + Sync {
    /// Tracked files under `relative_path` (empty for the whole repository), relative to `root`
    fn list_tracked_files(&self, root: &Path, relative_path: &str) -> Result<Vec<String>, GitError>;

    /// The tracked path for a single file, or `None` when git does not know about it
    fn tracked_file(&self, root: &Path, relative_path: &str) -> Result<Option<String>, GitError>;
}

/// Runs the `git` binary found on `PATH`
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl GitCli {
    /// Run `git -C <repo> <args>` and return trimmed stdout
    pub fn run(repo: &Path, args: &[&str]) -> Result<String, GitError> {
        Self::output(repo, args).map(|stdout| stdout.trim().to_string())
    }

    /// Run a `-z` listing and split it into paths exactly as git stores them
    pub fn run_paths(repo: &Path, args: &[&str]) -> Result<Vec<String>, GitError> {
        let stdout = Self::output(repo, args)?;
        Ok(stdout
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(String::from)
            .collect())
    }

    fn output(repo: &Path, args: &[&str]) -> Result<String, GitError> {
        let output = Command::new("git").arg("-C").arg(repo).args(args).output()?;

        if !output.status.success() {
            return Err(GitError::Command {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Top level of the working tree containing `start`
    pub fn repo_root(start: &Path) -> Result<PathBuf, GitError> {
        Self::run(start, &["rev-parse", "--show-toplevel"]).map(PathBuf::from)
    }
}

impl GitQuery for GitCli {
    fn list_tracked_files(&self, root: &Path, relative_path: &str) -> Result<Vec<String>, GitError> {
        if relative_path.is_empty() {
            Self::run_paths(root, &["ls-files", "-z"])
        } else {
            Self::run_paths(root, &["ls-files", "-z", "--", relative_path])
        }
    }

    fn tracked_file(&self, root: &Path, relative_path: &str) -> Result<Option<String>, GitError> {
        match Self::run_paths(root, &["ls-files", "-z", "--error-unmatch", "--", relative_path]) {
            Ok(paths) => Ok(paths.into_iter().next()),
            // --error-unmatch exits non-zero for untracked paths
            Err(GitError::Command { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

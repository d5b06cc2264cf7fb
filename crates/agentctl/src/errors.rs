use std::io;

use thiserror::Error;

use crate::git::GitError;
use crate::providers::errors::{enhance, ProviderError};

/// Failures raised by the sandbox, the repository tools, and the tool registry.
///
/// During a conversation these never reach the caller: the agent turns them into
/// `tool_result` blocks flagged `is_error` so the model can react to them.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("path traversal not allowed: {0}")]
    PathTraversal(String),

    #[error("file appears to be binary (contains null bytes)")]
    BinaryFile,

    #[error("file too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("file is ignored (matches ignore patterns)")]
    Ignored,

    #[error("path does not exist: {path}")]
    NotFound {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("path is a directory, not a file")]
    IsDirectory,

    #[error("directory depth limit ({0}) exceeded")]
    DepthLimitExceeded(usize),

    #[error("invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to list git files: {0}")]
    Git(#[from] GitError),

    #[error("failed to encode tool result: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("tool {0:?} already registered")]
    DuplicateTool(String),

    #[error("tool {0:?} not found")]
    ToolNotFound(String),
}

impl ToolError {
    pub(crate) fn io(context: &'static str) -> impl FnOnce(io::Error) -> ToolError {
        move |source| ToolError::Io { context, source }
    }

    pub(crate) fn not_found(path: &str) -> impl FnOnce(io::Error) -> ToolError {
        let path = path.to_string();
        move |source| ToolError::NotFound { path, source }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Conditions that end a conversation and are returned to whoever drives it.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("failed to parse input for tool {name:?}: {reason}")]
    MalformedToolInput { name: String, reason: String },

    #[error("max tool calls ({0}) exceeded")]
    MaxToolCalls(usize),

    #[error("max iterations ({0}) reached in tool use loop")]
    MaxIterations(usize),

    #[error("conversation cancelled")]
    Cancelled,

    /// Displays the provider error together with remediation advice
    #[error("failed to send message: {}", enhance(.0))]
    Provider(ProviderError),
}

pub type ConversationResult<T> = Result<T, ConversationError>;

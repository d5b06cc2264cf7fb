//! Hook for observing tool execution inside a conversation.

use serde_json::Value;
use tracing::{info, warn};

use crate::errors::ToolError;

#[derive(Debug)]
pub enum ToolEvent<'a> {
    Executing {
        name: &'a str,
        call_number: usize,
        path: Option<&'a str>,
    },
    Succeeded {
        name: &'a str,
        summary: String,
    },
    Failed {
        name: &'a str,
        error: &'a ToolError,
    },
}

pub trait ToolLogger: Send + Sync {
    fn log(&self, event: &ToolEvent<'_>);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl ToolLogger for NoopLogger {
    fn log(&self, _event: &ToolEvent<'_>) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ToolLogger for TracingLogger {
    fn log(&self, event: &ToolEvent<'_>) {
        match event {
            ToolEvent::Executing {
                name,
                call_number,
                path,
            } => info!(tool = name, call_number, path, "executing tool"),
            ToolEvent::Succeeded { name, summary } => info!(tool = name, %summary, "tool succeeded"),
            ToolEvent::Failed { name, error } => warn!(tool = name, %error, "tool failed"),
        }
    }
}

impl<F> ToolLogger for F
where
    F: Fn(&ToolEvent<'_>) + Send + Sync,
{
    fn log(&self, event: &ToolEvent<'_>) {
        self(event)
    }
}

/// Short description of a tool result: the path it touched, how many items it listed,
/// how many bytes it read
pub fn summarize(result: &Value) -> String {
    let mut parts = Vec::new();
    if let Some(path) = result.get("path").and_then(Value::as_str) {
        parts.push(format!("accessed {path}"));
    }
    if let Some(items) = result.get("items").and_then(Value::as_array) {
        parts.push(format!("listed {} items", items.len()));
    }
    if let Some(size) = result.get("size").and_then(Value::as_u64) {
        parts.push(format!("read {size} bytes"));
    }

    if parts.is_empty() {
        "ok".to_string()
    } else {
        parts.join(", ")
    }
}

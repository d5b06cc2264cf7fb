pub mod repo;
pub mod schemas;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::errors::{ToolError, ToolResult};
use crate::models::tool::Tool;

/// Tool arguments as supplied by the model: a loosely typed, string keyed map
pub type ToolInput = Map<String, Value>;

/// Executable bound to a [`Tool`] definition
pub type ToolHandler = Arc<dyn Fn(&ToolInput) -> ToolResult<Value> + Send + Sync>;

/// Maps tool names to their definition and handler.
///
/// Definitions are kept in registration order because they are sent verbatim with every
/// request to the model.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register<N, D, F>(
        &mut self,
        name: N,
        description: D,
        schema: Value,
        handler: F,
    ) -> ToolResult<()>
    where
        N: Into<String>,
        D: Into<String>,
        F: Fn(&ToolInput) -> ToolResult<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }

        self.tools
            .push(Tool::new(name.clone(), description, object_schema(&schema)));
        self.handlers.insert(name, Arc::new(handler));
        Ok(())
    }

    /// Registered tool definitions, in registration order
    pub fn list(&self) -> &[Tool] {
        &self.tools
    }

    /// Run the handler registered under `name`. Handler errors are returned untouched.
    pub fn dispatch(&self, name: &str, input: &ToolInput) -> ToolResult<Value> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;
        handler(input)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Reduce a schema to the `{type: object, properties, required}` shape the provider accepts
fn object_schema(schema: &Value) -> Value {
    let properties = schema
        .get("properties")
        .filter(|p| p.is_object())
        .cloned()
        .unwrap_or_else(|| json!({}));

    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

pub(crate) fn required_str<'a>(input: &'a ToolInput, key: &str) -> ToolResult<&'a str> {
    input
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidParameters(format!("{key} must be a string")))
}

/// Missing, null and empty values all read as `None`
pub(crate) fn optional_str<'a>(input: &'a ToolInput, key: &str) -> ToolResult<Option<&'a str>> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ToolError::InvalidParameters(format!(
            "{key} must be a string"
        ))),
    }
}

pub(crate) fn optional_bool(input: &ToolInput, key: &str) -> ToolResult<Option<bool>> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ToolError::InvalidParameters(format!(
            "{key} must be a boolean"
        ))),
    }
}

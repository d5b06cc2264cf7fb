use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
}

/// A request from the model to run one of the registered tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseBlock {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub input: Value,
}

/// The answer to a [`ToolUseBlock`], matched to it by `tool_use_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    #[serde(default)]
    pub is_error: bool,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Content passed inside a message, which can be plain text or one half of a tool round-trip
pub enum ContentBlock {
    Text(TextBlock),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
}

impl ContentBlock {
    pub fn text<S: Into<String>>(text: S) -> Self {
        ContentBlock::Text(TextBlock { text: text.into() })
    }

    pub fn tool_use<I: Into<String>, N: Into<String>>(id: I, name: N, input: Value) -> Self {
        ContentBlock::ToolUse(ToolUseBlock {
            id: id.into(),
            name: name.into(),
            input,
        })
    }

    pub fn tool_result<I: Into<String>, C: Into<String>>(
        tool_use_id: I,
        content: C,
        is_error: bool,
    ) -> Self {
        ContentBlock::ToolResult(ToolResultBlock {
            tool_use_id: tool_use_id.into(),
            is_error,
            content: content.into(),
        })
    }

    /// Get the text content if this is a Text variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUseBlock> {
        match self {
            ContentBlock::ToolUse(tool_use) => Some(tool_use),
            _ => None,
        }
    }

    pub fn as_tool_result(&self) -> Option<&ToolResultBlock> {
        match self {
            ContentBlock::ToolResult(tool_result) => Some(tool_result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blocks_use_wire_tags() {
        let block = ContentBlock::tool_use("toolu_1", "read_file", json!({"path": "README.md"}));
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "tool_use",
                "id": "toolu_1",
                "name": "read_file",
                "input": {"path": "README.md"}
            })
        );

        let block = ContentBlock::tool_result("toolu_1", "Error: boom", true);
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "tool_result",
                "tool_use_id": "toolu_1",
                "is_error": true,
                "content": "Error: boom"
            })
        );
    }

    #[test]
    fn test_text_block_ignores_extra_wire_fields() {
        let block: ContentBlock =
            serde_json::from_value(json!({"type": "text", "text": "hi", "citations": null}))
                .unwrap();
        assert_eq!(block.as_text(), Some("hi"));
        assert!(block.as_tool_use().is_none());
    }

    #[test]
    fn test_tool_use_without_input_defaults_to_null() {
        let block: ContentBlock =
            serde_json::from_value(json!({"type": "tool_use", "id": "a", "name": "list_git_files"}))
                .unwrap();
        assert_eq!(block.as_tool_use().unwrap().input, Value::Null);
    }
}

//! Input schemas for the repository exploration tools.

use serde_json::{json, Value};

pub fn list_directory() -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Directory path to list (relative to repository root)"
            },
            "recursive": {
                "type": "boolean",
                "description": "Also list the contents of subdirectories (default: false)"
            }
        },
        "required": ["path"]
    })
}

pub fn read_file() -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "File path to read (relative to repository root)"
            }
        },
        "required": ["path"]
    })
}

pub fn search_files() -> Value {
    json!({
        "type": "object",
        "properties": {
            "pattern": {
                "type": "string",
                "description": "Search pattern (regex or plain text)"
            },
            "path": {
                "type": "string",
                "description": "File or directory path to search in (relative to repository root, defaults to root)"
            },
            "case_sensitive": {
                "type": "boolean",
                "description": "Whether search is case sensitive (default: false)"
            }
        },
        "required": ["pattern"]
    })
}

pub fn get_file_info() -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "File path (relative to repository root)"
            }
        },
        "required": ["path"]
    })
}

pub fn list_git_files() -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Directory path to list tracked files in (relative to repository root, defaults to root)"
            }
        },
        "required": []
    })
}

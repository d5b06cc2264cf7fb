use std::fs;
use std::path::Path;
use std::process::Command;

use agentctl::errors::ToolError;
use agentctl::tools::repo::{RepoToolOptions, RepoTools};
use agentctl::tools::{ToolInput, ToolRegistry};
use serde_json::{json, Value};
use tempfile::TempDir;

fn input(value: Value) -> ToolInput {
    match value {
        Value::Object(map) => map,
        other => panic!("tool input must be an object, got {other}"),
    }
}

fn scratch_repo() -> (TempDir, ToolRegistry) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(
        dir.path().join("src/main.rs"),
        "fn main() {\n    // todo: parse args\n}\n",
    )
    .unwrap();

    let registry = RepoTools::new(dir.path())
        .into_registry(RepoToolOptions { advanced: true })
        .unwrap();
    (dir, registry)
}

#[test]
fn traversal_is_refused() {
    let (_dir, registry) = scratch_repo();

    for tool in ["read_file", "list_directory", "get_file_info"] {
        let err = registry
            .dispatch(tool, &input(json!({"path": "../etc/passwd"})))
            .unwrap_err();
        assert!(matches!(err, ToolError::PathTraversal(_)), "{tool}: {err}");
    }

    let err = registry
        .dispatch("search_files", &input(json!({"pattern": "root", "path": "../.."})))
        .unwrap_err();
    assert!(matches!(err, ToolError::PathTraversal(_)));
}

#[test]
fn read_file_returns_content_and_size() {
    let (_dir, registry) = scratch_repo();

    let result = registry
        .dispatch("read_file", &input(json!({"path": "notes.txt"})))
        .unwrap();
    assert_eq!(result["content"], "hello");
    assert_eq!(result["size"], 5);

    let again = registry
        .dispatch("read_file", &input(json!({"path": "notes.txt"})))
        .unwrap();
    assert_eq!(result, again);
}

#[test]
fn read_file_refuses_binary() {
    let (dir, registry) = scratch_repo();
    fs::write(dir.path().join("image.dat"), [0x00, 0x89, b'P', b'N', b'G']).unwrap();

    let err = registry
        .dispatch("read_file", &input(json!({"path": "image.dat"})))
        .unwrap_err();
    assert!(matches!(err, ToolError::BinaryFile));
    assert_eq!(err.to_string(), "file appears to be binary (contains null bytes)");
}

#[test]
fn search_reports_line_numbers() {
    let (_dir, registry) = scratch_repo();

    let result = registry
        .dispatch(
            "search_files",
            &input(json!({"pattern": "TODO", "path": ".", "case_sensitive": false})),
        )
        .unwrap();

    assert_eq!(
        result,
        json!({
            "pattern": "TODO",
            "path": ".",
            "matches": [{
                "path": "src/main.rs",
                "match_count": 1,
                "matching_lines": [{"line_number": 2, "content": "    // todo: parse args"}]
            }],
            "total": 1
        })
    );
}

#[test]
fn search_defaults_to_repository_root() {
    let (_dir, registry) = scratch_repo();

    let result = registry
        .dispatch("search_files", &input(json!({"pattern": "hello"})))
        .unwrap();
    assert_eq!(result["path"], ".");
    assert_eq!(result["matches"][0]["path"], "notes.txt");
}

#[test]
fn missing_required_parameter() {
    let (_dir, registry) = scratch_repo();

    let err = registry.dispatch("read_file", &ToolInput::new()).unwrap_err();
    assert_eq!(err.to_string(), "Invalid parameters: path must be a string");
}

#[test]
fn list_directory_shape() {
    let (_dir, registry) = scratch_repo();

    let result = registry
        .dispatch("list_directory", &input(json!({"path": "."})))
        .unwrap();
    assert_eq!(
        result,
        json!({
            "path": ".",
            "items": [
                {"name": "notes.txt", "type": "file", "size": 5},
                {"name": "src", "type": "directory"}
            ]
        })
    );
}

fn git(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[test]
fn list_git_files_uses_the_index() {
    let (dir, registry) = scratch_repo();
    if !git(dir.path(), &["init", "-q"]) {
        eprintln!("git not available, skipping");
        return;
    }
    assert!(git(dir.path(), &["add", "notes.txt", "src/main.rs"]));
    fs::write(dir.path().join("scratch.txt"), "untracked").unwrap();

    let all = registry
        .dispatch("list_git_files", &ToolInput::new())
        .unwrap();
    assert_eq!(all["total"], 2);
    assert_eq!(all["files"][0]["path"], "notes.txt");
    assert_eq!(all["files"][0]["size"], 5);
    assert_eq!(all["files"][1]["path"], "src/main.rs");

    let tracked = registry
        .dispatch("list_git_files", &input(json!({"path": "notes.txt"})))
        .unwrap();
    assert_eq!(tracked["total"], 1);

    let untracked = registry
        .dispatch("list_git_files", &input(json!({"path": "scratch.txt"})))
        .unwrap();
    assert_eq!(untracked["total"], 0);
    assert_eq!(untracked["files"], json!([]));

    let discovered = RepoTools::discover(&dir.path().join("src")).unwrap();
    assert_eq!(
        discovered.sandbox().root(),
        dir.path().canonicalize().unwrap()
    );
}

#[test]
fn list_git_files_keeps_non_ascii_names() {
    let (dir, registry) = scratch_repo();
    if !git(dir.path(), &["init", "-q"]) {
        eprintln!("git not available, skipping");
        return;
    }
    fs::write(dir.path().join("café.txt"), "crème").unwrap();
    fs::write(dir.path().join(" padded.txt"), "x").unwrap();
    assert!(git(dir.path(), &["add", "café.txt", " padded.txt", "notes.txt"]));

    let all = registry
        .dispatch("list_git_files", &ToolInput::new())
        .unwrap();
    let paths: Vec<&str> = all["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|file| file["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec![" padded.txt", "café.txt", "notes.txt"]);
    assert_eq!(all["files"][1]["size"], "crème".len());

    let single = registry
        .dispatch("list_git_files", &input(json!({"path": "café.txt"})))
        .unwrap();
    assert_eq!(single["total"], 1);
    assert_eq!(single["files"][0]["path"], "café.txt");
}

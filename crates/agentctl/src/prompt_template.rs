use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

use crate::models::tool::Tool;

const SYSTEM_PROMPT: &str = include_str!("prompts/system.md");

/// Get the path to the prompts directory
fn prompts_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("src").join("prompts")
}

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

pub fn load_prompt_file<T: Serialize>(
    template_file: impl Into<PathBuf>,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_path = template_file.into();
    // if the template_file doesn't exist, try to load it from the prompts directory
    let file_path = if !template_path.exists() {
        prompts_dir().join(template_path)
    } else {
        template_path
    };

    let template_content = fs::read_to_string(file_path)
        .map_err(|e| TeraError::chain("Failed to read template file", e))?;
    load_prompt(&template_content, context_data)
}

#[derive(Serialize)]
struct SystemPromptContext<'a> {
    repo_root: String,
    tools: &'a [Tool],
}

/// Render the system prompt for a repository, from `template_file` when given,
/// otherwise from the built-in template
pub fn system_prompt(
    repo_root: &Path,
    tools: &[Tool],
    template_file: Option<&Path>,
) -> Result<String, TeraError> {
    let context = SystemPromptContext {
        repo_root: repo_root.display().to_string(),
        tools,
    };

    match template_file {
        Some(path) => load_prompt_file(path, &context),
        None => load_prompt(SYSTEM_PROMPT, &context),
    }
}

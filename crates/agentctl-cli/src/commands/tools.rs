use std::env;

use anyhow::{Context, Result};
use console::style;

use agentctl::tools::repo::{RepoToolOptions, RepoTools};

pub fn execute(advanced: bool) -> Result<()> {
    let cwd = env::current_dir().context("failed to get working directory")?;
    let registry = RepoTools::new(cwd).into_registry(RepoToolOptions { advanced })?;

    for tool in registry.list() {
        println!("{}", style(&tool.name).bold().green());
        println!("  {}", tool.description);

        let required: Vec<&str> = tool.input_schema["required"]
            .as_array()
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        if let Some(properties) = tool.input_schema["properties"].as_object() {
            for name in properties.keys() {
                let marker = if required.contains(&name.as_str()) {
                    " (required)"
                } else {
                    ""
                };
                println!("    {}{}", style(name).cyan(), style(marker).dim());
            }
        }
    }
    Ok(())
}

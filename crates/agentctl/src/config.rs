use config::{Config, Environment};
use serde::Deserialize;
use thiserror::Error;

use crate::agent::{Limits, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOOL_CALLS};
use crate::providers::configs::DEFAULT_ANTHROPIC_HOST;

pub const ENV_PREFIX: &str = "AGENTCTL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {env_var}: {source}")]
    InvalidValue {
        env_var: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a dotted configuration key, e.g. `agent.max_tool_calls`
pub fn to_env_var(field_path: &str) -> String {
    format!(
        "{}_{}",
        ENV_PREFIX,
        field_path.to_uppercase().replace('.', "__")
    )
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: usize,
    /// Register search_files, get_file_info and list_git_files as well
    #[serde(default)]
    pub advanced_tools: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_tool_calls: default_max_tool_calls(),
            advanced_tools: false,
        }
    }
}

impl AgentSettings {
    pub fn limits(&self) -> Limits {
        Limits {
            max_iterations: self.max_iterations,
            max_tool_calls: self.max_tool_calls,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub agent: AgentSettings,
}

impl Settings {
    /// Defaults overlaid with `AGENTCTL_*` environment variables
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Provider defaults
            .set_default("provider.host", default_host())?
            .set_default("provider.model", default_model())?
            .set_default("provider.max_tokens", i64::from(default_max_tokens()))?
            .set_default("provider.timeout_secs", default_timeout_secs() as i64)?
            // Agent defaults
            .set_default("agent.max_iterations", default_max_iterations() as i64)?
            .set_default("agent.max_tool_calls", default_max_tool_calls() as i64)?
            .set_default("agent.advanced_tools", false)?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);

            if let config::ConfigError::Type { key: Some(key), .. } = &err {
                let env_var = to_env_var(key);
                ConfigError::InvalidValue {
                    env_var,
                    source: err,
                }
            } else {
                ConfigError::Other(err)
            }
        })
    }
}

fn default_host() -> String {
    DEFAULT_ANTHROPIC_HOST.to_string()
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_max_tool_calls() -> usize {
    DEFAULT_MAX_TOOL_CALLS
}

use std::env;

use super::errors::ProviderError;

pub const DEFAULT_ANTHROPIC_HOST: &str = "https://api.anthropic.com";
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnthropicProviderConfig {
    pub host: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl AnthropicProviderConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read the API key from `ANTHROPIC_API_KEY`
    pub fn from_env(host: impl Into<String>) -> Result<Self, ProviderError> {
        match env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(host, key.trim())),
            _ => Err(ProviderError::MissingApiKey),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

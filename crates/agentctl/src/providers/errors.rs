use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("ANTHROPIC_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("authorization failed (HTTP 403): {0}")]
    Forbidden(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("request timeout: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_builder() {
            ProviderError::Client(err.to_string())
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

const SET_API_KEY: &str = "To fix this:
  - Set ANTHROPIC_API_KEY environment variable: export ANTHROPIC_API_KEY=your-key
  - Get your API key at https://console.anthropic.com/";

const CHECK_API_KEY: &str = "To fix this:
  - Set ANTHROPIC_API_KEY environment variable: export ANTHROPIC_API_KEY=your-key
  - Verify your API key is valid at https://console.anthropic.com/";

const CHECK_PERMISSIONS: &str = "To fix this:
  - Verify your API key is correct: echo $ANTHROPIC_API_KEY
  - Check your API key permissions at https://console.anthropic.com/";

const RATE_LIMITED: &str = "The API rate limit has been reached. Please:
  - Wait a few moments and try again
  - Check your usage at https://console.anthropic.com/
  - Consider upgrading your plan if you frequently hit limits";

const TIMED_OUT: &str = "This may indicate:
  - Network connectivity issues - check your internet connection
  - API service temporarily unavailable - try again in a moment
  - Request took too long - the operation may have timed out";

const NETWORK: &str = "This may indicate:
  - No internet connection - check your network connectivity
  - Firewall blocking requests - check your firewall settings
  - DNS resolution issues - verify you can reach api.anthropic.com";

const API_ERROR: &str =
    "Check https://console.anthropic.com/ for account status and usage limits";

const GENERIC: &str =
    "For help, check https://docs.anthropic.com/ or verify your API key at https://console.anthropic.com/";

/// Render a provider error followed by a blank line and what the user can do about it.
///
/// Variants that already say what went wrong get their own advice; the rest are classified
/// by their message text.
pub fn enhance(err: &ProviderError) -> String {
    let remediation = match err {
        ProviderError::MissingApiKey => SET_API_KEY,
        ProviderError::Authentication(_) => CHECK_API_KEY,
        ProviderError::Forbidden(_) => CHECK_PERMISSIONS,
        ProviderError::RateLimited(_) => RATE_LIMITED,
        ProviderError::Api { .. } => API_ERROR,
        ProviderError::Timeout(_) => TIMED_OUT,
        ProviderError::Network(_) => NETWORK,
        ProviderError::InvalidResponse(message) | ProviderError::Client(message) => {
            return classify(err, message);
        }
    };
    format!("{err}\n\n{remediation}")
}

fn classify(err: &ProviderError, message: &str) -> String {
    let contains_any = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    if contains_any(&["timeout", "deadline exceeded"]) {
        format!("request timeout: {err}\n\n{TIMED_OUT}")
    } else if contains_any(&["connection", "network", "dial"]) {
        format!("network error: {err}\n\n{NETWORK}")
    } else if contains_any(&["ANTHROPIC_API_KEY", "not set", "not configured"]) {
        format!("{err}\n\n{SET_API_KEY}")
    } else {
        format!("Anthropic API error: {err}\n\n{GENERIC}")
    }
}

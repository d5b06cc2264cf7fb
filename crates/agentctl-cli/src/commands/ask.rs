use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use bat::PrettyPrinter;
use clap::Args;
use cliclack::spinner;
use console::Term;
use tokio_util::sync::CancellationToken;

use agentctl::agent::{Conversation, Limits};
use agentctl::config::Settings;
use agentctl::logger::TracingLogger;
use agentctl::prompt_template::system_prompt;
use agentctl::providers::anthropic::AnthropicProvider;
use agentctl::providers::configs::AnthropicProviderConfig;
use agentctl::providers::errors::enhance;
use agentctl::tools::repo::{RepoToolOptions, RepoTools};

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question about the repository
    pub prompt: String,

    /// Model to use (default from AGENTCTL_PROVIDER__MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum tokens per model response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Tool calls allowed for the whole session
    #[arg(long)]
    pub max_tool_calls: Option<usize>,

    /// Model requests allowed before giving up
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Also enable search_files, get_file_info and list_git_files
    #[arg(long)]
    pub advanced: bool,

    /// Log every tool call to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Tera template to render as the system prompt instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub system: Option<PathBuf>,
}

/// Settings after command line flags are applied
#[derive(Debug, Clone, PartialEq)]
pub struct AskOptions {
    pub host: String,
    pub timeout_secs: u64,
    pub model: String,
    pub max_tokens: u32,
    pub limits: Limits,
    pub advanced: bool,
}

impl AskArgs {
    pub fn options(&self, settings: Settings) -> AskOptions {
        let limits = settings.agent.limits();
        AskOptions {
            host: settings.provider.host,
            timeout_secs: settings.provider.timeout_secs,
            model: self.model.clone().unwrap_or(settings.provider.model),
            max_tokens: self.max_tokens.unwrap_or(settings.provider.max_tokens),
            limits: Limits {
                max_iterations: self.max_iterations.unwrap_or(limits.max_iterations),
                max_tool_calls: self.max_tool_calls.unwrap_or(limits.max_tool_calls),
            },
            advanced: self.advanced || settings.agent.advanced_tools,
        }
    }
}

pub async fn execute(args: AskArgs) -> Result<()> {
    let settings = Settings::new().context("failed to load configuration")?;
    let options = args.options(settings);

    let cwd = env::current_dir().context("failed to get working directory")?;
    let tools = RepoTools::discover(&cwd)
        .context("failed to get repository root (is this a git repository?)")?;
    let repo_root = tools.sandbox().root().to_path_buf();

    let registry = tools.into_registry(RepoToolOptions {
        advanced: options.advanced,
    })?;
    let system = system_prompt(&repo_root, registry.list(), args.system.as_deref())
        .context("failed to render system prompt")?;

    let config = AnthropicProviderConfig::from_env(options.host.as_str())
        .map_err(|err| anyhow!(enhance(&err)))?
        .with_timeout(options.timeout_secs);
    let provider = AnthropicProvider::new(config)?;

    let mut conversation =
        Conversation::new(Box::new(provider), registry).with_limits(options.limits);
    if args.verbose {
        conversation = conversation.with_logger(TracingLogger);
    }
    conversation.set_system(system);
    conversation.add_user_message(args.prompt);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    // The spinner would interleave with tool logs
    let spin = (!args.verbose).then(|| {
        let spin = spinner();
        spin.start("exploring the repository");
        spin
    });

    let result = conversation
        .send_with_cancel(&options.model, options.max_tokens, &cancel)
        .await;

    if let Some(spin) = spin {
        spin.stop(format!("{} tool calls", conversation.tool_calls()));
    }

    let answer = result?;
    render(&answer)
}

fn render(content: &str) -> Result<()> {
    if !Term::stdout().is_term() {
        println!("{content}");
        return Ok(());
    }

    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()
        .map_err(|err| anyhow!("failed to render answer: {err}"))?;
    println!();
    Ok(())
}

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::{ConversationError, ConversationResult};
use crate::logger::{summarize, NoopLogger, ToolEvent, ToolLogger};
use crate::models::content::{ContentBlock, ToolUseBlock};
use crate::models::message::Message;
use crate::providers::base::{CompletionRequest, Provider};
use crate::tools::{ToolInput, ToolRegistry};

pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_MAX_TOOL_CALLS: usize = 50;

/// Budgets for a single [`Conversation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Model requests allowed per [`Conversation::send`]
    pub max_iterations: usize,
    /// Tool dispatches allowed over the whole session
    pub max_tool_calls: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
        }
    }
}

/// A multi-turn session with a model that can call the registered tools.
///
/// The history only grows. Every assistant message that requests tools is immediately
/// followed by a user message answering each request, in order, before the model is
/// asked again.
pub struct Conversation {
    provider: Box<dyn Provider>,
    registry: ToolRegistry,
    messages: Vec<Message>,
    system: Option<String>,
    limits: Limits,
    tool_calls: usize,
    logger: Box<dyn ToolLogger>,
}

impl Conversation {
    pub fn new(provider: Box<dyn Provider>, registry: ToolRegistry) -> Self {
        Self {
            provider,
            registry,
            messages: Vec::new(),
            system: None,
            limits: Limits::default(),
            tool_calls: 0,
            logger: Box::new(NoopLogger),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_logger(mut self, logger: impl ToolLogger + 'static) -> Self {
        self.logger = Box::new(logger);
        self
    }

    pub fn set_system(&mut self, system: impl Into<String>) {
        self.system = Some(system.into());
    }

    pub fn add_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user().with_text(text));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Tools dispatched so far in this session
    pub fn tool_calls(&self) -> usize {
        self.tool_calls
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Add `prompt` as a user message and drive the conversation to a final answer
    pub async fn run_conversation(
        &mut self,
        prompt: impl Into<String>,
        model: &str,
        max_tokens: u32,
    ) -> ConversationResult<String> {
        self.add_user_message(prompt);
        self.send(model, max_tokens).await
    }

    pub async fn send(&mut self, model: &str, max_tokens: u32) -> ConversationResult<String> {
        self.send_with_cancel(model, max_tokens, &CancellationToken::new())
            .await
    }

    /// Ask the model for a reply, running any tools it requests, until it answers with text.
    ///
    /// Tool failures are handed back to the model as error results. Only budget exhaustion,
    /// provider failures, malformed tool input and cancellation end the loop with an error.
    pub async fn send_with_cancel(
        &mut self,
        model: &str,
        max_tokens: u32,
        cancel: &CancellationToken,
    ) -> ConversationResult<String> {
        for iteration in 1..=self.limits.max_iterations {
            self.check_tool_budget()?;

            let request = CompletionRequest {
                model,
                max_tokens,
                system: self.system.as_deref(),
                messages: &self.messages,
                tools: self.registry.list(),
            };
            debug!(iteration, messages = self.messages.len(), "requesting completion");

            let (mut response, _usage) = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ConversationError::Cancelled),
                result = self.provider.complete(request) => result.map_err(ConversationError::Provider)?,
            };

            fill_missing_inputs(&mut response);
            if !response.has_tool_use() {
                let answer = response.text().trim().to_string();
                self.messages.push(response);
                return Ok(answer);
            }

            let mut results = Message::user();
            for tool_use in response.tool_uses() {
                if cancel.is_cancelled() {
                    return Err(ConversationError::Cancelled);
                }
                results = results.with_content(self.execute_tool(tool_use)?);
            }

            self.messages.push(response);
            self.messages.push(results);
        }

        Err(ConversationError::MaxIterations(self.limits.max_iterations))
    }

    fn check_tool_budget(&self) -> ConversationResult<()> {
        if self.tool_calls >= self.limits.max_tool_calls {
            return Err(ConversationError::MaxToolCalls(self.limits.max_tool_calls));
        }
        Ok(())
    }

    /// Dispatch one tool request and turn the outcome into its `tool_result` block
    fn execute_tool(&mut self, tool_use: &ToolUseBlock) -> ConversationResult<ContentBlock> {
        self.check_tool_budget()?;
        self.tool_calls += 1;

        let input = tool_input(tool_use)?;
        let name = tool_use.name.as_str();
        self.logger.log(&ToolEvent::Executing {
            name,
            call_number: self.tool_calls,
            path: input.get("path").and_then(Value::as_str),
        });

        Ok(match self.registry.dispatch(name, &input) {
            Ok(result) => {
                self.logger.log(&ToolEvent::Succeeded {
                    name,
                    summary: summarize(&result),
                });
                ContentBlock::tool_result(&tool_use.id, result.to_string(), false)
            }
            Err(error) => {
                self.logger.log(&ToolEvent::Failed {
                    name,
                    error: &error,
                });
                ContentBlock::tool_result(&tool_use.id, format!("Error: {error}"), true)
            }
        })
    }
}

/// The Messages API rejects a `tool_use` echoed back with `"input": null`
fn fill_missing_inputs(message: &mut Message) {
    for block in &mut message.content {
        if let ContentBlock::ToolUse(tool_use) = block {
            if tool_use.input.is_null() {
                tool_use.input = Value::Object(ToolInput::new());
            }
        }
    }
}

/// Project the model supplied input onto a string keyed map; a missing input is empty
fn tool_input(tool_use: &ToolUseBlock) -> ConversationResult<ToolInput> {
    match &tool_use.input {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(ToolInput::new()),
        other => Err(ConversationError::MalformedToolInput {
            name: tool_use.name.clone(),
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

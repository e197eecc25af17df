//! Assistant loop: hosted model + tool registry
//!
//! Each user query starts a fresh conversation. The model either answers
//! directly or requests tool calls; requested calls are executed through
//! the [`ToolRegistry`] and their results fed back until the model
//! produces a final answer or the round limit is reached.

mod openai;

pub use openai::{ChatMessage, FunctionCall, OpenAiChat, Role, ToolCallRequest};

use crate::error::{DocScoutError, Result};
use crate::tool::{ToolCall, ToolDefinition, ToolRegistry};
use crate::{DEFAULT_API_BASE, DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_MODEL};
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, warn};

/// Environment variable holding the model API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Words that end the interactive session
const EXIT_COMMANDS: &[&str] = &["quit", "exit", "q"];

/// Default system prompt
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant with access to these tools:

1. fetch_url_content(url): fetch a web page as markdown text
2. search_repo_docs(repo, query, num_results): search the markdown documentation of a GitHub repository
3. count_word(url, word): count how many times a word appears on a web page

Use the tools when they help answer the question. Be concise.";

/// A hosted chat model that supports tool calling
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the conversation and return the model's next message
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage>;
}

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Model identifier
    pub model: String,
    /// Chat-completions API base URL
    pub api_base: String,
    /// API key
    pub api_key: Option<String>,
    /// Maximum model round trips with tool calls per query
    pub max_tool_rounds: usize,
    /// System prompt sent at the start of each conversation
    pub system_prompt: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

impl AssistantConfig {
    /// Default configuration with the API key read from the environment
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(DocScoutError::MissingApiKey(API_KEY_ENV))?;
        Ok(Self::default().api_key(api_key))
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the tool round limit
    pub fn max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Build the chat-completions client this configuration describes
    pub fn chat_model(&self) -> Result<OpenAiChat> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(DocScoutError::MissingApiKey(API_KEY_ENV))?;
        OpenAiChat::new(&self.api_base, api_key, &self.model)
    }
}

/// Drives the model/tool conversation
pub struct Assistant<M> {
    model: M,
    registry: Arc<ToolRegistry>,
    tools: Vec<ToolDefinition>,
    max_tool_rounds: usize,
    system_prompt: String,
}

impl Assistant<OpenAiChat> {
    /// Create an assistant backed by the chat-completions API
    pub fn from_config(config: &AssistantConfig, registry: Arc<ToolRegistry>) -> Result<Self> {
        let model = config.chat_model()?;
        Ok(Self::new(model, registry)
            .max_tool_rounds(config.max_tool_rounds)
            .system_prompt(config.system_prompt.clone()))
    }
}

impl<M: ChatModel> Assistant<M> {
    /// Create an assistant with default limits
    pub fn new(model: M, registry: Arc<ToolRegistry>) -> Self {
        let tools = registry.definitions();
        Self {
            model,
            registry,
            tools,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Set the tool round limit
    pub fn max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Answer one user query, calling tools as the model requests
    ///
    /// `on_tool_call` is invoked with the tool name and raw arguments
    /// before each call is executed.
    pub async fn respond<F>(&self, user_message: &str, mut on_tool_call: F) -> Result<String>
    where
        F: FnMut(&str, &str),
    {
        let mut messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(user_message),
        ];

        let mut reply = self.model.complete(&messages, &self.tools).await?;
        let mut rounds = 0;

        while !reply.tool_calls.is_empty() {
            if rounds >= self.max_tool_rounds {
                warn!(rounds, "Tool round limit reached");
                return Err(DocScoutError::ToolRoundLimit(rounds));
            }
            rounds += 1;

            let calls = reply.tool_calls.clone();
            messages.push(reply);

            for call in calls {
                on_tool_call(&call.function.name, &call.function.arguments);
                let result = self.execute(&call).await;
                messages.push(ChatMessage::tool_result(call.id, result));
            }

            reply = self.model.complete(&messages, &self.tools).await?;
        }

        Ok(reply.content.unwrap_or_default())
    }

    /// Run one requested call, turning failures into tool output
    async fn execute(&self, call: &ToolCallRequest) -> String {
        let outcome = match ToolCall::parse_str(&call.function.name, &call.function.arguments) {
            Ok(parsed) => self.registry.dispatch(parsed).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(text) => text,
            Err(e) => {
                debug!(tool = %call.function.name, error = %e, "Tool call failed");
                format!("Error calling tool: {}", e)
            }
        }
    }

    /// Interactive loop: read queries from `input`, print answers to `output`
    ///
    /// Ends on an exit command or end of input. Errors from a single query
    /// are printed and the loop continues.
    pub async fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> io::Result<()> {
        loop {
            write!(output, "\nYou: ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output, "\nGoodbye!")?;
                return Ok(());
            }

            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if EXIT_COMMANDS.contains(&query.to_lowercase().as_str()) {
                writeln!(output, "Goodbye!")?;
                return Ok(());
            }

            let mut trace_error = None;
            let result = self
                .respond(query, |name, args| {
                    if trace_error.is_some() {
                        return;
                    }
                    let traced = writeln!(output, "  [Calling tool: {}({})]", name, args)
                        .and_then(|_| output.flush());
                    if let Err(e) = traced {
                        trace_error = Some(e);
                    }
                })
                .await;
            if let Some(e) = trace_error {
                return Err(e);
            }

            match result {
                Ok(answer) => writeln!(output, "\nAssistant: {}", answer)?,
                Err(e) => writeln!(output, "\nError: {}", e)?,
            }
        }
    }
}
